//! Внешний слой сжатия полезной нагрузки (кадровый формат LZ4).
//!
//! Заголовок файла всегда пишется до этого слоя, поэтому magic остаётся
//! читаемым и у сжатых файлов.

use std::io::{self, Read, Write};

use rfcap_types::{Compression, RfcapResult};

/// Уровень сжатия LZ4.
pub const LZ4_LEVEL: u32 = 6;

/// Писатель, опционально сжимающий поток LZ4.
pub enum CompressedWriter<W: Write> {
    Plain(W),
    Lz4(lz4::Encoder<W>),
}

impl<W: Write> CompressedWriter<W> {
    pub fn new(
        inner: W,
        compression: Compression,
    ) -> RfcapResult<Self> {
        match compression {
            Compression::None => Ok(Self::Plain(inner)),
            Compression::Lz4 => {
                let encoder = lz4::EncoderBuilder::new()
                    .level(LZ4_LEVEL)
                    .build(inner)?;
                Ok(Self::Lz4(encoder))
            }
        }
    }

    pub fn compression(&self) -> Compression {
        match self {
            Self::Plain(_) => Compression::None,
            Self::Lz4(_) => Compression::Lz4,
        }
    }

    /// Дописывает завершающий маркер кадра и возвращает поток.
    pub fn finish(self) -> RfcapResult<W> {
        match self {
            Self::Plain(w) => Ok(w),
            Self::Lz4(encoder) => {
                let (w, result) = encoder.finish();
                result?;
                Ok(w)
            }
        }
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Lz4(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Lz4(e) => e.flush(),
        }
    }
}

/// Читатель, опционально распаковывающий LZ4.
pub enum CompressedReader<R: Read> {
    Plain(R),
    Lz4(lz4::Decoder<R>),
}

impl<R: Read> CompressedReader<R> {
    pub fn new(
        inner: R,
        compression: Compression,
    ) -> RfcapResult<Self> {
        match compression {
            Compression::None => Ok(Self::Plain(inner)),
            Compression::Lz4 => Ok(Self::Lz4(lz4::Decoder::new(inner)?)),
        }
    }

    pub fn compression(&self) -> Compression {
        match self {
            Self::Plain(_) => Compression::None,
            Self::Lz4(_) => Compression::Lz4,
        }
    }
}

impl<R: Read> Read for CompressedReader<R> {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Lz4(d) => d.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_lz4_round_trip() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 7) as u8).collect();

        let mut w = CompressedWriter::new(Vec::new(), Compression::Lz4).unwrap();
        w.write_all(&data).unwrap();
        let compressed = w.finish().unwrap();

        assert!(compressed.len() < data.len(), "LZ4 должен уменьшить размер");
        // LZ4 frame magic 0x184D2204
        assert_eq!(&compressed[0..4], &[0x04, 0x22, 0x4D, 0x18]);

        let mut r = CompressedReader::new(Cursor::new(compressed), Compression::Lz4).unwrap();
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_plain_passthrough() {
        let mut w = CompressedWriter::new(Vec::new(), Compression::None).unwrap();
        assert_eq!(w.compression(), Compression::None);
        w.write_all(b"iq").unwrap();
        assert_eq!(w.finish().unwrap(), b"iq");
    }
}
