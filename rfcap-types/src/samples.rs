use crate::{RfcapError, RfcapResult, SampleFormat};

/// Типизированный буфер комплексных выборок.
///
/// Каждая выборка хранится как пара `[real, imag]` фиксированного размера,
/// поэтому буфер из `N` выборок можно рассматривать как плоский массив
/// скаляров длиной `2N`.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<[u8; 2]>),
    I8(Vec<[i8; 2]>),
    I16(Vec<[i16; 2]>),
    C64(Vec<[f32; 2]>),
}

impl Samples {
    /// Буфер из `len` нулевых выборок заданного формата.
    pub fn new(
        format: SampleFormat,
        len: usize,
    ) -> RfcapResult<Self> {
        match format {
            SampleFormat::U8 => Ok(Samples::U8(vec![[0; 2]; len])),
            SampleFormat::I8 => Ok(Samples::I8(vec![[0; 2]; len])),
            SampleFormat::I16 => Ok(Samples::I16(vec![[0; 2]; len])),
            SampleFormat::C64 => Ok(Samples::C64(vec![[0.0; 2]; len])),
            SampleFormat::Unknown(v) => Err(RfcapError::UnsupportedFormat(v)),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            Samples::U8(_) => SampleFormat::U8,
            Samples::I8(_) => SampleFormat::I8,
            Samples::I16(_) => SampleFormat::I16,
            Samples::C64(_) => SampleFormat::C64,
        }
    }

    /// Длина в выборках (не в байтах).
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::I8(v) => v.len(),
            Samples::I16(v) => v.len(),
            Samples::C64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Длина в байтах в нативной раскладке формата.
    pub fn byte_len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len() * 2,
            Samples::I8(v) => v.len() * 2,
            Samples::I16(v) => v.len() * 4,
            Samples::C64(v) => v.len() * 8,
        }
    }

    pub fn truncate(
        &mut self,
        len: usize,
    ) {
        match self {
            Samples::U8(v) => v.truncate(len),
            Samples::I8(v) => v.truncate(len),
            Samples::I16(v) => v.truncate(len),
            Samples::C64(v) => v.truncate(len),
        }
    }

    /// Копирует первые `n` выборок из `src` в `self[at..at + n]`.
    pub fn copy_from(
        &mut self,
        at: usize,
        src: &Samples,
        n: usize,
    ) -> RfcapResult<()> {
        if n > src.len() || at + n > self.len() {
            return Err(RfcapError::BufferTooSmall {
                needed: at + n,
                available: self.len().min(at + src.len()),
            });
        }

        match (self, src) {
            (Samples::U8(d), Samples::U8(s)) => d[at..at + n].copy_from_slice(&s[..n]),
            (Samples::I8(d), Samples::I8(s)) => d[at..at + n].copy_from_slice(&s[..n]),
            (Samples::I16(d), Samples::I16(s)) => d[at..at + n].copy_from_slice(&s[..n]),
            (Samples::C64(d), Samples::C64(s)) => d[at..at + n].copy_from_slice(&s[..n]),
            (d, s) => {
                return Err(RfcapError::FormatMismatch {
                    expected: d.format(),
                    found: s.format(),
                })
            }
        }

        Ok(())
    }

    pub fn as_i16(&self) -> Option<&[[i16; 2]]> {
        match self {
            Samples::I16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i16_mut(&mut self) -> Option<&mut Vec<[i16; 2]>> {
        match self {
            Samples::I16(v) => Some(v),
            _ => None,
        }
    }
}
