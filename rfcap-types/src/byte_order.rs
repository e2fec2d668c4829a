use std::fmt;

/// Порядок байт полезной нагрузки.
///
/// На диске хранится одним байтом: 0 = little, 1 = big.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ByteOrder {
    Little = 0,
    Big = 1,
}

impl ByteOrder {
    /// Порядок байт хоста.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Декодирует байт порядка. `None` для неизвестных значений, вызывающий
    /// решает, как их трактовать.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ByteOrder::Little),
            1 => Some(ByteOrder::Big),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ByteOrder::Little => write!(f, "little"),
            ByteOrder::Big => write!(f, "big"),
        }
    }
}

impl std::str::FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" => Ok(ByteOrder::Big),
            "native" => Ok(ByteOrder::native()),
            _ => Err(format!("Unknown byte order '{s}'. Use: little, big, native")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_matches_probe() {
        let probe = 0xABCDu16.to_ne_bytes();
        let expected = if probe == [0xCD, 0xAB] {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(ByteOrder::native(), expected);
        assert!(expected.is_native());
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(ByteOrder::from_u8(0), Some(ByteOrder::Little));
        assert_eq!(ByteOrder::from_u8(1), Some(ByteOrder::Big));
        assert_eq!(ByteOrder::from_u8(7), None);
    }
}
