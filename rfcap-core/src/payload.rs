//! Кодек полезной нагрузки: типизированные выборки ↔ байты в объявленном
//! порядке.
//!
//! Компоненты каждой выборки лежат подряд как `[real, imag]`. Если объявленный
//! порядок совпадает с порядком хоста, кодирование сводится к копированию,
//! иначе каждый компонент переставляется побайтно.

use std::io::{ErrorKind, Read, Write};

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use rfcap_types::{
    ByteOrder, RfcapError, RfcapResult, SampleFormat, SampleReader, SampleWriter, Samples,
};

/// Кодирует весь буфер в `out` (содержимое `out` заменяется).
pub fn encode_samples(
    samples: &Samples,
    order: ByteOrder,
    out: &mut Vec<u8>,
) {
    out.clear();
    out.resize(samples.byte_len(), 0);

    match samples {
        Samples::U8(v) => out.copy_from_slice(v.as_flattened()),
        Samples::I8(v) => {
            for (o, s) in out.iter_mut().zip(v.as_flattened()) {
                *o = *s as u8;
            }
        }
        Samples::I16(v) => match order {
            ByteOrder::Little => LittleEndian::write_i16_into(v.as_flattened(), out),
            ByteOrder::Big => BigEndian::write_i16_into(v.as_flattened(), out),
        },
        Samples::C64(v) => match order {
            ByteOrder::Little => LittleEndian::write_f32_into(v.as_flattened(), out),
            ByteOrder::Big => BigEndian::write_f32_into(v.as_flattened(), out),
        },
    }
}

/// Декодирует `n` выборок из `bytes` в начало `samples`.
///
/// `bytes.len()` должен быть равен `n * bytes_per_sample`.
pub fn decode_samples(
    bytes: &[u8],
    order: ByteOrder,
    samples: &mut Samples,
    n: usize,
) -> RfcapResult<usize> {
    let bps = samples.format().bytes_per_sample()?;
    if bytes.len() != n * bps || n > samples.len() {
        return Err(RfcapError::BufferTooSmall {
            needed: n * bps,
            available: bytes.len(),
        });
    }

    match samples {
        Samples::U8(v) => v[..n].as_flattened_mut().copy_from_slice(bytes),
        Samples::I8(v) => {
            for (s, b) in v[..n].as_flattened_mut().iter_mut().zip(bytes) {
                *s = *b as i8;
            }
        }
        Samples::I16(v) => {
            let dst = v[..n].as_flattened_mut();
            match order {
                ByteOrder::Little => LittleEndian::read_i16_into(bytes, dst),
                ByteOrder::Big => BigEndian::read_i16_into(bytes, dst),
            }
        }
        Samples::C64(v) => {
            let dst = v[..n].as_flattened_mut();
            match order {
                ByteOrder::Little => LittleEndian::read_f32_into(bytes, dst),
                ByteOrder::Big => BigEndian::read_f32_into(bytes, dst),
            }
        }
    }

    Ok(n)
}

/// Проверяет, что буфер вызывающего совпадает с форматом потока.
fn check_format(
    stream: SampleFormat,
    samples: &Samples,
) -> RfcapResult<()> {
    if let SampleFormat::Unknown(id) = stream {
        return Err(RfcapError::UnsupportedFormat(id));
    }

    if samples.format() != stream {
        return Err(RfcapError::FormatMismatch {
            expected: stream,
            found: samples.format(),
        });
    }

    Ok(())
}

/// Пишет выборки в байтовый поток в объявленном порядке байт.
pub struct PayloadWriter<W: Write> {
    inner: W,
    sample_rate: u32,
    format: SampleFormat,
    byte_order: ByteOrder,
    scratch: Vec<u8>,
}

impl<W: Write> PayloadWriter<W> {
    pub fn new(
        inner: W,
        sample_rate: u32,
        format: SampleFormat,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            inner,
            sample_rate,
            format,
            byte_order,
            scratch: Vec::new(),
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> SampleWriter for PayloadWriter<W> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn sample_format(&self) -> SampleFormat {
        self.format
    }

    fn write(
        &mut self,
        samples: &Samples,
    ) -> RfcapResult<usize> {
        check_format(self.format, samples)?;

        encode_samples(samples, self.byte_order, &mut self.scratch);
        self.inner.write_all(&self.scratch)?;

        Ok(samples.len())
    }
}

/// Читает выборки из байтового потока в объявленном порядке байт.
pub struct PayloadReader<R: Read> {
    inner: R,
    sample_rate: u32,
    format: SampleFormat,
    byte_order: ByteOrder,
    scratch: Vec<u8>,
}

impl<R: Read> PayloadReader<R> {
    pub fn new(
        inner: R,
        sample_rate: u32,
        format: SampleFormat,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            inner,
            sample_rate,
            format,
            byte_order,
            scratch: Vec::new(),
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> SampleReader for PayloadReader<R> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn sample_format(&self) -> SampleFormat {
        self.format
    }

    /// Читает хотя бы одну целую выборку (или EOF). Оборванная выборка в
    /// конце потока даёт [`RfcapError::UnexpectedEof`].
    fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        check_format(self.format, samples)?;

        let bps = self.format.bytes_per_sample()?;
        let want = samples.len() * bps;
        if want == 0 {
            return Ok(0);
        }

        self.scratch.resize(want, 0);
        let mut filled = 0;

        while filled == 0 || filled % bps != 0 {
            match self.inner.read(&mut self.scratch[filled..want]) {
                Ok(0) if filled == 0 => return Ok(0),
                Ok(0) => {
                    return Err(RfcapError::unexpected_eof(format!(
                        "payload ends {} bytes into a {bps}-byte {} sample",
                        filled % bps,
                        self.format
                    )))
                }
                Ok(k) => filled += k,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        decode_samples(
            &self.scratch[..filled],
            self.byte_order,
            samples,
            filled / bps,
        )
    }
}

/// Заполняет буфер целиком.
///
/// Возвращает `Ok(0)`, если поток уже закончился, и
/// [`RfcapError::UnexpectedEof`], если он закончился на середине буфера.
pub fn read_full<R: SampleReader + ?Sized>(
    reader: &mut R,
    samples: &mut Samples,
) -> RfcapResult<usize> {
    let total = samples.len();

    let mut got = reader.read(samples)?;
    if got == 0 || got == total {
        return Ok(got);
    }

    let mut tmp = Samples::new(samples.format(), total - got)?;

    while got < total {
        tmp.truncate(total - got);

        let n = reader.read(&mut tmp)?;
        if n == 0 {
            return Err(RfcapError::unexpected_eof(format!(
                "stream ended after {got} of {total} samples"
            )));
        }

        samples.copy_from(got, &tmp, n)?;
        got += n;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Reader, отдающий данные по `step` байт за вызов.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(
            &mut self,
            buf: &mut [u8],
        ) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_encode_i16_both_orders() {
        let s = Samples::I16(vec![[0x0102, -2]]);
        let mut out = Vec::new();

        encode_samples(&s, ByteOrder::Little, &mut out);
        assert_eq!(out, [0x02, 0x01, 0xFE, 0xFF]);

        encode_samples(&s, ByteOrder::Big, &mut out);
        assert_eq!(out, [0x01, 0x02, 0xFF, 0xFE]);
    }

    #[test]
    fn test_encode_c64_zero() {
        let s = Samples::C64(vec![[0.0, 0.0]]);
        let mut out = Vec::new();
        encode_samples(&s, ByteOrder::Little, &mut out);
        assert_eq!(out, [0u8; 8]);
    }

    #[test]
    fn test_encode_c64_big_endian() {
        let s = Samples::C64(vec![[1.0, -1.0]]);
        let mut out = Vec::new();
        encode_samples(&s, ByteOrder::Big, &mut out);
        assert_eq!(&out[0..4], &1.0f32.to_be_bytes());
        assert_eq!(&out[4..8], &(-1.0f32).to_be_bytes());
    }

    #[test]
    fn test_encode_u8_ignores_order() {
        let s = Samples::U8(vec![[1, 2], [3, 4]]);
        let mut le = Vec::new();
        let mut be = Vec::new();
        encode_samples(&s, ByteOrder::Little, &mut le);
        encode_samples(&s, ByteOrder::Big, &mut be);
        assert_eq!(le, [1, 2, 3, 4]);
        assert_eq!(le, be);
    }

    #[test]
    fn test_writer_reader_round_trip() {
        let cases = [
            Samples::U8(vec![[1, 2], [3, 4], [4, 3], [2, 1]]),
            Samples::I8(vec![[-128, 127], [0, -1]]),
            Samples::I16(vec![[i16::MIN, i16::MAX], [0x0AB0, -0x0AB0], [1, -1]]),
            Samples::C64(vec![[0.5, -0.25], [f32::MAX, f32::MIN_POSITIVE]]),
        ];

        for samples in cases {
            for order in [ByteOrder::Little, ByteOrder::Big] {
                let mut w = PayloadWriter::new(Vec::new(), 1_000, samples.format(), order);
                assert_eq!(w.write(&samples).unwrap(), samples.len());
                let bytes = w.into_inner();
                assert_eq!(bytes.len(), samples.byte_len());

                let mut r = PayloadReader::new(Cursor::new(bytes), 1_000, samples.format(), order);
                let mut out = Samples::new(samples.format(), samples.len()).unwrap();
                assert_eq!(r.read(&mut out).unwrap(), samples.len());
                assert_eq!(out, samples);

                // следующий read: EOF
                assert_eq!(r.read(&mut out).unwrap(), 0);
            }
        }
    }

    #[test]
    fn test_reader_reassembles_split_samples() {
        let samples = Samples::I16(vec![[1, 2], [3, 4], [5, 6]]);
        let mut bytes = Vec::new();
        encode_samples(&samples, ByteOrder::Big, &mut bytes);

        let trickle = Trickle {
            data: bytes,
            pos: 0,
            step: 3,
        };
        let mut r = PayloadReader::new(trickle, 1, SampleFormat::I16, ByteOrder::Big);
        let mut out = Samples::new(SampleFormat::I16, 3).unwrap();

        assert_eq!(read_full(&mut r, &mut out).unwrap(), 3);
        assert_eq!(out, samples);
    }

    #[test]
    fn test_reader_truncated_sample() {
        let bytes = vec![0u8; 4 + 3]; // одна I16 выборка + 3 байта
        let mut r = PayloadReader::new(Cursor::new(bytes), 1, SampleFormat::I16, ByteOrder::Little);
        let mut out = Samples::new(SampleFormat::I16, 4).unwrap();

        assert!(matches!(
            r.read(&mut out),
            Err(RfcapError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_reader_format_checks() {
        let mut r = PayloadReader::new(
            Cursor::new(vec![0u8; 8]),
            1,
            SampleFormat::C64,
            ByteOrder::Little,
        );
        let mut wrong = Samples::new(SampleFormat::U8, 1).unwrap();
        assert!(matches!(
            r.read(&mut wrong),
            Err(RfcapError::FormatMismatch { .. })
        ));

        let mut r = PayloadReader::new(
            Cursor::new(vec![0u8; 8]),
            1,
            SampleFormat::Unknown(77),
            ByteOrder::Little,
        );
        let mut buf = Samples::new(SampleFormat::U8, 1).unwrap();
        assert!(matches!(
            r.read(&mut buf),
            Err(RfcapError::UnsupportedFormat(77))
        ));
    }

    #[test]
    fn test_read_full_short_stream() {
        let mut r = PayloadReader::new(
            Cursor::new(vec![1u8, 2, 3, 4]),
            1,
            SampleFormat::U8,
            ByteOrder::Little,
        );
        let mut out = Samples::new(SampleFormat::U8, 3).unwrap();

        assert!(matches!(
            read_full(&mut r, &mut out),
            Err(RfcapError::UnexpectedEof(_))
        ));
    }
}
