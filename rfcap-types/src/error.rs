use thiserror::Error;

use crate::SampleFormat;

/// Результат для операций rfcap
pub type RfcapResult<T> = std::result::Result<T, RfcapError>;

/// Типы ошибок формата rfcap.
#[derive(Debug, Error)]
pub enum RfcapError {
    /// Первые 6 байт не равны `RFCAP1`
    #[error("Unknown magic: {0:02x?}")]
    UnknownMagic([u8; 6]),

    /// Нарушены инварианты заголовка
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Идентификатор формата выборок неизвестен этой сборке
    #[error("Unsupported sample format id: {0}")]
    UnsupportedFormat(u8),

    /// Длина входа упаковщика не кратна размеру группы
    #[error("Misaligned length: {len} is not a multiple of {multiple}")]
    MisalignedLength { len: usize, multiple: usize },

    /// Выходной буфер упаковщика слишком мал
    #[error("Buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Поток оборвался посреди выборки или группы упаковки
    #[error("Unexpected EOF: {0}")]
    UnexpectedEof(String),

    /// Изменяющий вызов на виртуальном SDR
    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    /// Буфер выборок другого формата, чем поток
    #[error("Sample format mismatch: expected {expected}, found {found}")]
    FormatMismatch {
        expected: SampleFormat,
        found: SampleFormat,
    },

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RfcapError {
    /// Удобные конструкторы
    pub fn invalid_header<S: Into<String>>(s: S) -> Self {
        Self::InvalidHeader(s.into())
    }

    pub fn unexpected_eof<S: Into<String>>(s: S) -> Self {
        Self::UnexpectedEof(s.into())
    }

    /// Переводит `io::ErrorKind::UnexpectedEof` в [`RfcapError::UnexpectedEof`],
    /// остальные ошибки оставляет как есть.
    pub fn from_io_eof(
        e: std::io::Error,
        what: &str,
    ) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof(format!("{what}: {e}"))
        } else {
            Self::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_eof_maps_kind() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        assert!(matches!(
            RfcapError::from_io_eof(eof, "header"),
            RfcapError::UnexpectedEof(_)
        ));

        let other = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            RfcapError::from_io_eof(other, "header"),
            RfcapError::Io(_)
        ));
    }

    #[test]
    fn test_display_messages() {
        let e = RfcapError::MisalignedLength { len: 5, multiple: 4 };
        assert_eq!(
            e.to_string(),
            "Misaligned length: 5 is not a multiple of 4"
        );

        let e = RfcapError::UnknownMagic(*b"RFCAP0");
        assert!(e.to_string().contains("Unknown magic"));
    }
}
