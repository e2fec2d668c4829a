use std::io::{BufReader, BufWriter, Read, Write};

use log::{debug, warn};
use rfcap_types::{
    Compression, Header, RfcapError, RfcapResult, SampleFormat, SampleReader,
    SampleWriter, Samples,
};

use crate::{
    compression::{CompressedReader, CompressedWriter},
    format::{read_header, HeaderExt},
    pack_stream::{pack_writer, unpack_reader, PackWriter, TransformReader},
    payload::{PayloadReader, PayloadWriter},
};

type Sink<W> = PayloadWriter<CompressedWriter<BufWriter<W>>>;
type Source<R> = PayloadReader<CompressedReader<BufReader<R>>>;

enum WriteStack<W: Write> {
    Plain(Sink<W>),
    Packed(PackWriter<Sink<W>>),
}

enum ReadStack<R: Read> {
    Plain(Source<R>),
    Packed(TransformReader<Source<R>>),
}

/// Потоковый писатель rfcap файлов.
///
/// Слои снаружи внутрь: заголовок, LZ4 (по выбору вызывающего), кодек
/// полезной нагрузки, nibble-упаковщик (если `header.compressed`).
pub struct RfcapWriter<W: Write> {
    /// `None` только после `finish`.
    stack: Option<WriteStack<W>>,
    header: Header,
    compression: Compression,
    samples_written: u64,
}

/// Потоковый читатель rfcap файлов.
pub struct RfcapReader<R: Read> {
    stack: ReadStack<R>,
    header: Header,
    compression: Compression,
    samples_read: u64,
}

impl<W: Write> RfcapWriter<W> {
    /// Создаёт писатель без LZ4, немедленно записывая заголовок в поток.
    pub fn new(
        inner: W,
        header: Header,
    ) -> RfcapResult<Self> {
        Self::with_compression(inner, header, Compression::None)
    }

    /// Создаёт писатель с заданным внешним сжатием.
    ///
    /// Заголовок проверяется до записи: при ошибке в `inner` не попадает ни
    /// одного байта.
    pub fn with_compression(
        inner: W,
        header: Header,
        compression: Compression,
    ) -> RfcapResult<Self> {
        let encoded = header.encode()?;

        let mut writer = BufWriter::new(inner);
        writer.write_all(&encoded)?;

        let compressed = CompressedWriter::new(writer, compression)?;
        let payload = PayloadWriter::new(
            compressed,
            header.sample_rate,
            header.sample_format,
            header.effective_byte_order(),
        );

        let stack = if header.compressed {
            WriteStack::Packed(pack_writer(payload)?)
        } else {
            WriteStack::Plain(payload)
        };

        debug!(
            "rfcap writer: {} @ {} Hz, {} order, packed={}, compression={}",
            header.sample_format,
            header.sample_rate,
            header.effective_byte_order(),
            header.compressed,
            compression,
        );

        Ok(Self {
            stack: Some(stack),
            header,
            compression,
            samples_written: 0,
        })
    }

    /// Записывает выборки. Формат буфера должен совпадать с заголовком.
    pub fn write(
        &mut self,
        samples: &Samples,
    ) -> RfcapResult<usize> {
        let n = match self.stack_mut()? {
            WriteStack::Plain(w) => w.write(samples)?,
            WriteStack::Packed(w) => w.write(samples)?,
        };

        self.samples_written += n as u64;
        Ok(n)
    }

    /// Сбрасывает буферы. Кадр LZ4 при этом не закрывается.
    pub fn flush(&mut self) -> RfcapResult<()> {
        let sink = match self.stack_mut()? {
            WriteStack::Plain(w) => w.get_mut(),
            WriteStack::Packed(w) => w.get_mut().get_mut(),
        };
        sink.flush()?;

        Ok(())
    }

    /// Завершает запись и возвращает исходный поток.
    ///
    /// Без вызова `finish` кадр LZ4 останется незакрытым, а хвост
    /// упаковщика потеряется.
    pub fn finish(mut self) -> RfcapResult<W> {
        let payload = match self.stack.take() {
            Some(WriteStack::Plain(w)) => w,
            Some(WriteStack::Packed(w)) => w.finish()?,
            None => return Err(RfcapError::NotSupported("rfcap writer already finished")),
        };

        let mut writer = payload.into_inner().finish()?;
        writer.flush()?;

        let inner = writer
            .into_inner()
            .map_err(|e| RfcapError::Io(e.into_error()))?;

        debug!("rfcap writer finished: {} samples", self.samples_written);

        Ok(inner)
    }

    /// Выборки, ждущие в упаковщике до полной группы из 4.
    pub fn pending_samples(&self) -> usize {
        match &self.stack {
            Some(WriteStack::Packed(w)) => w.buffered(),
            _ => 0,
        }
    }

    /// Отбрасывает неполную группу упаковки, чтобы `finish` прошёл на
    /// остановленной посреди группы записи. Возвращает число выборок.
    pub fn discard_partial_group(&mut self) -> RfcapResult<usize> {
        let n = match self.stack_mut()? {
            WriteStack::Plain(_) => 0,
            WriteStack::Packed(w) => w.discard_buffered(),
        };

        self.samples_written -= n as u64;
        Ok(n)
    }

    /// Заголовок, записанный в начало файла.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Количество выборок, принятых писателем.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    fn stack_mut(&mut self) -> RfcapResult<&mut WriteStack<W>> {
        self.stack
            .as_mut()
            .ok_or(RfcapError::NotSupported("rfcap writer already finished"))
    }
}

impl<W: Write> Drop for RfcapWriter<W> {
    fn drop(&mut self) {
        let pending = match &self.stack {
            None => return,
            Some(WriteStack::Packed(w)) => w.buffered() > 0,
            Some(WriteStack::Plain(_)) => false,
        };

        if pending || self.compression == Compression::Lz4 {
            warn!(
                "rfcap writer dropped without finish() after {} samples; capture is truncated",
                self.samples_written
            );
        }
    }
}

impl<W: Write> SampleWriter for RfcapWriter<W> {
    fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    fn sample_format(&self) -> SampleFormat {
        self.header.sample_format
    }

    fn write(
        &mut self,
        samples: &Samples,
    ) -> RfcapResult<usize> {
        RfcapWriter::write(self, samples)
    }
}

impl<R: Read> RfcapReader<R> {
    /// Создаёт читатель, читая и проверяя заголовок из `inner`.
    pub fn new(inner: R) -> RfcapResult<Self> {
        Self::with_compression(inner, Compression::None)
    }

    /// Создаёт читатель для файла с внешним сжатием `compression`.
    ///
    /// Заголовок читается напрямую из `inner`, до буферизации, поэтому при
    /// ошибке поток стоит ровно за 48 байтами заголовка.
    pub fn with_compression(
        mut inner: R,
        compression: Compression,
    ) -> RfcapResult<Self> {
        let header = read_header(&mut inner)?;
        header.validate()?;

        let decompressed = CompressedReader::new(BufReader::new(inner), compression)?;
        let payload = PayloadReader::new(
            decompressed,
            header.sample_rate,
            header.sample_format,
            header.effective_byte_order(),
        );

        let stack = if header.compressed {
            ReadStack::Packed(unpack_reader(payload)?)
        } else {
            ReadStack::Plain(payload)
        };

        debug!(
            "rfcap reader: {} @ {} Hz, {} order, packed={}, compression={}",
            header.sample_format,
            header.sample_rate,
            header.effective_byte_order(),
            header.compressed,
            compression,
        );

        Ok(Self {
            stack,
            header,
            compression,
            samples_read: 0,
        })
    }

    /// Читает выборки; `Ok(0)` означает конец файла.
    pub fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        let n = match &mut self.stack {
            ReadStack::Plain(r) => r.read(samples)?,
            ReadStack::Packed(r) => r.read(samples)?,
        };

        self.samples_read += n as u64;
        Ok(n)
    }

    /// Прочитанный и проверенный заголовок файла.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }
}

impl<R: Read> SampleReader for RfcapReader<R> {
    fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    fn sample_format(&self) -> SampleFormat {
        self.header.sample_format
    }

    fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        RfcapReader::read(self, samples)
    }
}

/// Convenience: открывает файл без LZ4 и возвращает читатель вместе с копией
/// заголовка.
pub fn open_reader<R: Read>(stream: R) -> RfcapResult<(RfcapReader<R>, Header)> {
    let reader = RfcapReader::new(stream)?;
    let header = reader.header().clone();

    Ok((reader, header))
}

/// Convenience: начинает файл без LZ4.
pub fn open_writer<W: Write>(
    stream: W,
    header: Header,
) -> RfcapResult<RfcapWriter<W>> {
    RfcapWriter::new(stream, header)
}
