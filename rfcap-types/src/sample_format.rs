use std::fmt;

use crate::{RfcapError, RfcapResult};

/// Флаг "nibble-сжатие" в старшем бите байта формата на диске.
pub const COMPRESSED_FLAG: u8 = 0x80;

/// Формат комплексных выборок.
///
/// Идентификаторы на диске стабильны между версиями. Неизвестный
/// идентификатор сохраняется в [`SampleFormat::Unknown`] и приводит к
/// [`RfcapError::UnsupportedFormat`] при первом обращении к данным.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 32-битные числа с плавающей точкой (F32, F32)
    C64,
    /// Беззнаковые байты (U8, U8), как у RTL-SDR
    U8,
    /// 16-битные целые числа (I16, Q16)
    I16,
    /// Знаковые байты (I8, Q8), как у HackRF
    I8,
    /// Идентификатор, не известный этой сборке
    Unknown(u8),
}

impl SampleFormat {
    /// Формат по 7-битному идентификатору на диске.
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => SampleFormat::C64,
            2 => SampleFormat::U8,
            3 => SampleFormat::I16,
            4 => SampleFormat::I8,
            other => SampleFormat::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            SampleFormat::C64 => 1,
            SampleFormat::U8 => 2,
            SampleFormat::I16 => 3,
            SampleFormat::I8 => 4,
            SampleFormat::Unknown(v) => *v,
        }
    }

    /// Размер одной IQ пары в байтах
    pub fn bytes_per_sample(&self) -> RfcapResult<usize> {
        match self {
            SampleFormat::U8 | SampleFormat::I8 => Ok(2), // 1 байт I + 1 байт Q
            SampleFormat::I16 => Ok(4),                   // 2 байта I + 2 байта Q
            SampleFormat::C64 => Ok(8),                   // 4 байта I + 4 байта Q
            SampleFormat::Unknown(v) => Err(RfcapError::UnsupportedFormat(*v)),
        }
    }

    /// Имеет ли порядок байт смысл для этого формата.
    pub fn is_multi_byte(&self) -> bool {
        matches!(self, SampleFormat::I16 | SampleFormat::C64)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            SampleFormat::C64 => write!(f, "c64"),
            SampleFormat::U8 => write!(f, "u8"),
            SampleFormat::I16 => write!(f, "i16"),
            SampleFormat::I8 => write!(f, "i8"),
            SampleFormat::Unknown(v) => write!(f, "unknown({v})"),
        }
    }
}

impl std::str::FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c64" | "complex64" | "f32" => Ok(SampleFormat::C64),
            "u8" | "uint8" => Ok(SampleFormat::U8),
            "i16" | "int16" => Ok(SampleFormat::I16),
            "i8" | "int8" => Ok(SampleFormat::I8),
            _ => Err(format!(
                "Unknown sample format '{s}'. Use: u8, i8, i16, c64"
            )),
        }
    }
}
