//! Чтение полезной нагрузки через io_uring (только Linux).
//!
//! Ускоритель пути чтения: результат тот же, что у [`crate::RfcapReader`]
//! без LZ4, но данные забираются блоками через очереди
//! submission/completion. Nibble-упакованные файлы распаковываются в
//! [`UringReader::decode_into`].

use std::{
    fs::File,
    io::{self, Seek, SeekFrom},
    os::fd::AsRawFd,
};

use io_uring::{opcode, types, IoUring};
use log::{debug, warn};
use rfcap_types::{Header, RfcapError, RfcapResult, SampleFormat, Samples};

use crate::{
    format::{read_header, HEADER_SIZE},
    packer::{unpack_iq, PACKED_IQ_GROUP, UNPACKED_IQ_GROUP},
    payload::decode_samples,
};

/// Параметры [`UringReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UringOptions {
    /// Размер одного iovec в байтах.
    pub block_size: usize,
    /// Выборок в одном буфере, который отдаёт `read_next`.
    pub iq_length: usize,
    /// Глубина очередей кольца.
    pub queue_depth: u32,
}

impl Default for UringOptions {
    fn default() -> Self {
        Self {
            block_size: 4096,
            iq_length: 32 * 1024,
            queue_depth: 32,
        }
    }
}

/// Читатель rfcap файла поверх io_uring.
pub struct UringReader {
    file: File,
    ring: IoUring,
    header: Header,
    buf: Vec<u8>,
    iovecs: Vec<libc::iovec>,
    /// Байт в неделимой единице: выборка или группа упаковки.
    unit: usize,
    /// Упакованные выборки перед распаковкой.
    packed: Samples,
    /// Смещение следующего чтения от начала файла.
    offset: u64,
    filled: usize,
    in_flight: bool,
}

impl UringReader {
    /// Читает заголовок из файла, стоящего на байте 0, и готовит кольцо.
    pub fn new(
        mut file: File,
        opts: UringOptions,
    ) -> RfcapResult<Self> {
        file.seek(SeekFrom::Start(0))?;
        let header = read_header(&mut file)?;
        header.validate()?;

        let bps = header.sample_format.bytes_per_sample()?;
        let iq_size = bps * opts.iq_length;
        if opts.block_size == 0 || iq_size == 0 || iq_size % opts.block_size != 0 {
            return Err(RfcapError::MisalignedLength {
                len: iq_size,
                multiple: opts.block_size,
            });
        }

        let unit = if header.compressed {
            bps * PACKED_IQ_GROUP
        } else {
            bps
        };
        if iq_size < unit {
            return Err(RfcapError::BufferTooSmall {
                needed: unit,
                available: iq_size,
            });
        }

        let ring = IoUring::new(opts.queue_depth)?;

        let mut buf = vec![0u8; iq_size];
        let iovecs = buf
            .chunks_mut(opts.block_size)
            .map(|chunk| libc::iovec {
                iov_base: chunk.as_mut_ptr().cast(),
                iov_len: chunk.len(),
            })
            .collect();

        debug!(
            "uring reader: {} @ {} Hz, {} blocks of {} bytes",
            header.sample_format,
            header.sample_rate,
            iq_size / opts.block_size,
            opts.block_size,
        );

        let packed = Samples::new(header.sample_format, 0)?;

        Ok(Self {
            file,
            ring,
            header,
            buf,
            iovecs,
            unit,
            packed,
            offset: HEADER_SIZE as u64,
            filled: 0,
            in_flight: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Текущее смещение чтения в файле.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Читает следующий буфер. `false` означает конец файла.
    ///
    /// Смещение сдвигается только на целые выборки (группы упаковки);
    /// хвост короче одной единицы в конце файла даёт
    /// [`RfcapError::UnexpectedEof`].
    pub fn read_next(&mut self) -> RfcapResult<bool> {
        loop {
            self.submit()?;

            let res = self.wait()?;
            if res == -libc::EINTR || res == -libc::EAGAIN {
                continue;
            }
            if res < 0 {
                return Err(io::Error::from_raw_os_error(-res).into());
            }

            let n = res as usize;
            let whole = n - n % self.unit;
            if n > 0 && whole == 0 {
                self.filled = 0;
                return Err(RfcapError::unexpected_eof(format!(
                    "rfcap payload: {n} trailing bytes at offset {}, need {}",
                    self.offset, self.unit
                )));
            }

            // Остаток перечитается следующим запросом с нового смещения
            self.filled = whole;
            self.offset += whole as u64;

            return Ok(whole > 0);
        }
    }

    /// Байты, полученные последним `read_next`.
    pub fn buffer(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Число выборок в последнем буфере после распаковки.
    pub fn samples_in_buffer(&self) -> usize {
        let groups = self.filled / self.unit;

        if self.header.compressed {
            groups * UNPACKED_IQ_GROUP
        } else {
            groups
        }
    }

    /// Декодирует последний буфер в выборки формата заголовка,
    /// распаковывая nibble-сжатие.
    ///
    /// `samples` должен вмещать [`Self::samples_in_buffer`] выборок.
    pub fn decode_into(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        if samples.format() != self.header.sample_format {
            return Err(RfcapError::FormatMismatch {
                expected: self.header.sample_format,
                found: samples.format(),
            });
        }

        let needed = self.samples_in_buffer();
        if samples.len() < needed {
            return Err(RfcapError::BufferTooSmall {
                needed,
                available: samples.len(),
            });
        }

        let bps = self.header.sample_format.bytes_per_sample()?;
        let order = self.header.effective_byte_order();
        let n = self.filled / bps;

        if !self.header.compressed {
            return decode_samples(&self.buf[..self.filled], order, samples, n);
        }

        let found = samples.format();
        let out = samples.as_i16_mut().ok_or(RfcapError::FormatMismatch {
            expected: SampleFormat::I16,
            found,
        })?;

        if self.packed.len() < n {
            self.packed = Samples::new(SampleFormat::I16, n)?;
        }
        decode_samples(&self.buf[..self.filled], order, &mut self.packed, n)?;

        match &self.packed {
            Samples::I16(v) => unpack_iq(&v[..n], &mut out[..needed]),
            other => Err(RfcapError::FormatMismatch {
                expected: SampleFormat::I16,
                found: other.format(),
            }),
        }
    }

    fn submit(&mut self) -> RfcapResult<()> {
        let entry = opcode::Readv::new(
            types::Fd(self.file.as_raw_fd()),
            self.iovecs.as_ptr(),
            self.iovecs.len() as u32,
        )
        .offset(self.offset)
        .build();

        // SAFETY: iovecs указывают в self.buf, который не перераспределяется
        // и живёт дольше операции: Drop дожидается завершения.
        unsafe {
            self.ring
                .submission()
                .push(&entry)
                .map_err(|_| io::Error::other("submission queue is full"))?;
        }
        self.in_flight = true;

        Ok(())
    }

    /// Ждёт одно завершение и возвращает его результат.
    fn wait(&mut self) -> RfcapResult<i32> {
        loop {
            match self.ring.submit_and_wait(1) {
                Ok(_) => {}
                Err(e) if e.raw_os_error() == Some(libc::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }

            // Запись из очереди помечается просмотренной при drop
            if let Some(cqe) = self.ring.completion().next() {
                self.in_flight = false;
                return Ok(cqe.result());
            }
        }
    }
}

impl Drop for UringReader {
    fn drop(&mut self) {
        if self.in_flight {
            if let Err(e) = self.wait() {
                warn!("uring reader: failed to drain in-flight read: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rfcap_types::{ByteOrder, SampleFormat};

    use super::*;
    use crate::stream::RfcapWriter;

    fn capture(samples: usize) -> tempfile::NamedTempFile {
        let data: Vec<[i16; 2]> = (0..samples).map(|i| [i as i16, -(i as i16)]).collect();
        capture_with(data, false)
    }

    fn capture_with(
        data: Vec<[i16; 2]>,
        compressed: bool,
    ) -> tempfile::NamedTempFile {
        let mut header = Header::new(433.92e6, 1_000_000, SampleFormat::I16);
        header.byte_order = Some(ByteOrder::Big);
        header.compressed = compressed;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let mut writer = RfcapWriter::new(tmp.as_file_mut(), header).unwrap();
        writer.write(&Samples::I16(data)).unwrap();
        writer.finish().unwrap().flush().unwrap();
        tmp
    }

    fn open(
        tmp: &tempfile::NamedTempFile,
        opts: UringOptions,
    ) -> Option<UringReader> {
        match UringReader::new(tmp.reopen().unwrap(), opts) {
            Ok(r) => Some(r),
            // Ядро без io_uring (или запрет seccomp): пропускаем
            Err(RfcapError::Io(e)) => {
                eprintln!("io_uring unavailable: {e}");
                None
            }
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn test_misaligned_block_size() {
        let tmp = capture(8);
        let opts = UringOptions {
            block_size: 3000,
            ..UringOptions::default()
        };

        assert!(matches!(
            UringReader::new(tmp.reopen().unwrap(), opts),
            Err(RfcapError::MisalignedLength { .. })
        ));
    }

    #[test]
    fn test_reads_whole_payload() {
        let tmp = capture(1_000);
        let opts = UringOptions {
            block_size: 1024,
            iq_length: 256,
            queue_depth: 4,
        };
        let Some(mut reader) = open(&tmp, opts) else {
            return;
        };

        let mut out = Vec::new();
        let mut buf = Samples::new(SampleFormat::I16, 256).unwrap();
        while reader.read_next().unwrap() {
            let n = reader.decode_into(&mut buf).unwrap();
            out.extend_from_slice(&buf.as_i16().unwrap()[..n]);
        }

        assert_eq!(out.len(), 1_000);
        assert_eq!(out[999], [999, -999]);
        assert_eq!(reader.offset(), (HEADER_SIZE + 4_000) as u64);
    }

    fn drain(reader: &mut UringReader) -> RfcapResult<Vec<[i16; 2]>> {
        let mut out = Vec::new();
        let mut buf = Samples::new(SampleFormat::I16, 512).unwrap();
        while reader.read_next()? {
            let n = reader.decode_into(&mut buf)?;
            out.extend_from_slice(&buf.as_i16().unwrap()[..n]);
        }
        Ok(out)
    }

    #[test]
    fn test_truncated_tail_is_unexpected_eof() {
        let tmp = capture(10);
        let len = tmp.as_file().metadata().unwrap().len();
        tmp.as_file().set_len(len - 1).unwrap();

        let Some(mut reader) = open(&tmp, UringOptions::default()) else {
            return;
        };

        assert!(reader.read_next().unwrap());
        assert_eq!(reader.samples_in_buffer(), 9);
        assert_eq!(reader.offset(), (HEADER_SIZE + 36) as u64);

        assert!(matches!(
            reader.read_next(),
            Err(RfcapError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_packed_payload_is_unpacked() {
        let data: Vec<[i16; 2]> = (0..1_000)
            .map(|i| {
                let v = ((i * 16) & 0x7FF0) as i16;
                [v, -v]
            })
            .collect();
        let tmp = capture_with(data.clone(), true);

        // 1024 байта на буфер не кратны группе из 12 байт
        let opts = UringOptions {
            block_size: 1024,
            iq_length: 256,
            queue_depth: 4,
        };
        let Some(mut reader) = open(&tmp, opts) else {
            return;
        };
        assert!(reader.header().compressed);

        let out = drain(&mut reader).unwrap();
        assert_eq!(out, data);
        assert_eq!(reader.offset(), (HEADER_SIZE + 750 * 4) as u64);
    }

    #[test]
    fn test_decode_into_checks_buffer() {
        let tmp = capture(300);
        let Some(mut reader) = open(&tmp, UringOptions::default()) else {
            return;
        };
        assert!(reader.read_next().unwrap());

        let mut small = Samples::new(SampleFormat::I16, 100).unwrap();
        assert!(matches!(
            reader.decode_into(&mut small),
            Err(RfcapError::BufferTooSmall { needed: 300, .. })
        ));

        let mut wrong = Samples::new(SampleFormat::C64, 300).unwrap();
        assert!(matches!(
            reader.decode_into(&mut wrong),
            Err(RfcapError::FormatMismatch { .. })
        ));
    }
}
