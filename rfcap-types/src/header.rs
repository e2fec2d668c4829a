use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::Serialize;

use crate::{ByteOrder, RfcapError, RfcapResult, SampleFormat};

/// MIME тип файлов rfcap v1.
pub const MIME_TYPE: &str = "application/x-hztools.rfcap";

/// Магическое число в начале файла (6 байт).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magic(pub [u8; 6]);

impl Magic {
    /// Единственная поддерживаемая версия: b"RFCAP1"
    pub const VERSION_1: Magic = Magic(*b"RFCAP1");

    pub fn is_known(&self) -> bool {
        *self == Self::VERSION_1
    }
}

impl Default for Magic {
    fn default() -> Self {
        Self::VERSION_1
    }
}

impl fmt::Display for Magic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.is_known() {
            write!(f, "rfcap v1")
        } else {
            write!(f, "unknown")
        }
    }
}

/// Заголовок rfcap файла (на диске ровно 48 байт).
///
/// После построения не меняется: писатель и читатель держат свою копию.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Всегда `RFCAP1`
    pub magic: Magic,
    /// Момент начала записи (наносекундная точность)
    pub capture_time: SystemTime,
    /// Несущая частота в Гц
    pub center_frequency: f64,
    /// Комплексных выборок в секунду
    pub sample_rate: u32,
    /// Формат IQ выборок
    pub sample_format: SampleFormat,
    /// Данные упакованы 12-битным nibble-упаковщиком (только I16)
    pub compressed: bool,
    /// Порядок байт полезной нагрузки. Для U8 может отсутствовать.
    pub byte_order: Option<ByteOrder>,
}

impl Header {
    /// Новый заголовок с текущим временем и порядком байт хоста.
    pub fn new(
        center_frequency: f64,
        sample_rate: u32,
        sample_format: SampleFormat,
    ) -> Self {
        Header {
            magic: Magic::VERSION_1,
            capture_time: SystemTime::now(),
            center_frequency,
            sample_rate,
            sample_format,
            compressed: false,
            byte_order: Some(ByteOrder::native()),
        }
    }

    /// Проверяет инварианты заголовка перед записью.
    pub fn validate(&self) -> RfcapResult<()> {
        if !self.magic.is_known() {
            return Err(RfcapError::UnknownMagic(self.magic.0));
        }

        if self.sample_format != SampleFormat::U8 && self.byte_order.is_none() {
            return Err(RfcapError::invalid_header(format!(
                "byte order must be set for {} samples",
                self.sample_format
            )));
        }

        if self.compressed && self.sample_format != SampleFormat::I16 {
            return Err(RfcapError::invalid_header(format!(
                "nibble compression is only valid for i16, not {}",
                self.sample_format
            )));
        }

        Ok(())
    }

    /// Порядок байт данных; отсутствующий трактуется как little-endian.
    pub fn effective_byte_order(&self) -> ByteOrder {
        self.byte_order.unwrap_or(ByteOrder::Little)
    }

    /// Время захвата в наносекундах от Unix epoch.
    pub fn capture_time_ns(&self) -> RfcapResult<i64> {
        system_time_to_unix_nanos(self.capture_time)
    }

    /// Плоское представление для вывода / JSON.
    pub fn summary(&self) -> HeaderSummary {
        HeaderSummary {
            magic: self.magic.to_string(),
            capture_time_ns: self.capture_time_ns().ok(),
            center_frequency_hz: self.center_frequency,
            sample_rate: self.sample_rate,
            sample_format: self.sample_format.to_string(),
            compressed: self.compressed,
            byte_order: self.effective_byte_order().to_string(),
        }
    }
}

/// Снимок заголовка для отображения.
#[derive(Debug, Clone, Serialize)]
pub struct HeaderSummary {
    pub magic: String,
    pub capture_time_ns: Option<i64>,
    pub center_frequency_hz: f64,
    pub sample_rate: u32,
    pub sample_format: String,
    pub compressed: bool,
    pub byte_order: String,
}

/// `SystemTime` → наносекунды от epoch (i64, может быть отрицательным).
pub fn system_time_to_unix_nanos(t: SystemTime) -> RfcapResult<i64> {
    let out_of_range = || RfcapError::invalid_header("capture time out of i64 nanosecond range");

    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_nanos()).map_err(|_| out_of_range()),
        Err(e) => {
            let before = i64::try_from(e.duration().as_nanos()).map_err(|_| out_of_range())?;
            Ok(-before)
        }
    }
}

/// Наносекунды от epoch → `SystemTime`.
pub fn unix_nanos_to_system_time(ns: i64) -> SystemTime {
    let magnitude = Duration::from_nanos(ns.unsigned_abs());

    if ns >= 0 {
        UNIX_EPOCH + magnitude
    } else {
        UNIX_EPOCH - magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header(format: SampleFormat) -> Header {
        Header::new(1_337_000_000.0, 180_000_000, format)
    }

    #[test]
    fn test_magic_display() {
        assert_eq!(Magic::VERSION_1.to_string(), "rfcap v1");
        assert_eq!(Magic(*b"RFCAP0").to_string(), "unknown");
    }

    #[test]
    fn test_validate_requires_byte_order() {
        let mut h = make_header(SampleFormat::I16);
        h.byte_order = None;
        assert!(matches!(h.validate(), Err(RfcapError::InvalidHeader(_))));

        // U8 допускает отсутствие порядка байт
        let mut h = make_header(SampleFormat::U8);
        h.byte_order = None;
        h.validate().unwrap();
    }

    #[test]
    fn test_validate_compressed_only_i16() {
        let mut h = make_header(SampleFormat::C64);
        h.compressed = true;
        assert!(matches!(h.validate(), Err(RfcapError::InvalidHeader(_))));

        let mut h = make_header(SampleFormat::I16);
        h.compressed = true;
        h.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_magic() {
        let mut h = make_header(SampleFormat::U8);
        h.magic = Magic(*b"RFCAP0");
        assert!(matches!(h.validate(), Err(RfcapError::UnknownMagic(_))));
    }

    #[test]
    fn test_unix_nanos_round_trip() {
        for ns in [0i64, 1, -1, 1_704_067_200_123_456_789, -86_400_000_000_007] {
            let t = unix_nanos_to_system_time(ns);
            assert_eq!(system_time_to_unix_nanos(t).unwrap(), ns);
        }
    }

    #[test]
    fn test_summary_serializes() {
        let mut h = make_header(SampleFormat::I16);
        h.capture_time = unix_nanos_to_system_time(42);
        h.byte_order = Some(ByteOrder::Big);

        let s = h.summary();
        assert_eq!(s.magic, "rfcap v1");
        assert_eq!(s.capture_time_ns, Some(42));
        assert_eq!(s.sample_format, "i16");
        assert_eq!(s.byte_order, "big");
    }
}
