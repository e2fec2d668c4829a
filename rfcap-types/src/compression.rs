use std::fmt;

/// Тип внешнего сжатия потока полезной нагрузки.
///
/// В заголовке не хранится: выбирается снаружи при открытии потока.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Compression {
    /// Без сжатия
    #[default]
    None = 0,
    /// Кадровый формат LZ4
    Lz4 = 1,
}

impl fmt::Display for Compression {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Lz4 => write!(f, "lz4"),
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "no" | "off" => Ok(Compression::None),
            "lz4" => Ok(Compression::Lz4),
            _ => Err(format!("Unknown compression '{s}'. Use: none, lz4")),
        }
    }
}
