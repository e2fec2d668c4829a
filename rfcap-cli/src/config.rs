use std::path::PathBuf;

use rfcap_types::{ByteOrder, Compression, SampleFormat};

use crate::{CliError, CliResult};

/// Полная конфигурация сессии записи.
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Несущая частота (Гц)
    pub center_freq_hz: u64,
    /// Частота дискретизации (Гц)
    pub sample_rate_hz: u32,
    /// Формат выборок
    pub sample_format: SampleFormat,
    /// Порядок байт полезной нагрузки
    pub byte_order: ByteOrder,
    /// 12-битная упаковка (только i16)
    pub pack: bool,
    /// Внешнее сжатие
    pub compression: Compression,
    /// Путь к выходному .rfcap файлу
    pub output_path: PathBuf,
    /// Ограничение по времени (None = до Ctrl+C)
    pub duration_secs: Option<u64>,
    /// Ограничение по числу выборок
    pub max_samples: Option<u64>,
    /// Выборок в одном чанке от приёмника
    pub chunk_samples: usize,
    /// Ёмкость канала между потоками (в чанках)
    pub ring_capacity: usize,
    /// Выдавать выборки в темпе sample_rate
    pub realtime: bool,
    /// Интервал вывода статистики (секунды)
    pub stats_interval_secs: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl RecordConfig {
    /// Проверяет согласованность параметров до открытия файла.
    pub fn validate(&self) -> CliResult<()> {
        if self.sample_rate_hz == 0 {
            return Err(CliError::InvalidArgument(
                "sample rate must be positive".to_string(),
            ));
        }

        if self.chunk_samples == 0 || self.ring_capacity == 0 {
            return Err(CliError::InvalidArgument(
                "chunk size and ring capacity must be positive".to_string(),
            ));
        }

        if self.pack && self.sample_format != SampleFormat::I16 {
            return Err(CliError::InvalidArgument(format!(
                "--pack requires i16 samples, got {}",
                self.sample_format
            )));
        }

        Ok(())
    }

    /// Предел выборок с учётом упаковки: упаковщик принимает только группы
    /// по 4 выборки.
    pub fn sample_limit(&self) -> Option<u64> {
        self.max_samples
            .map(|n| if self.pack { n / 4 * 4 } else { n })
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            center_freq_hz: 1_602_000_000,
            sample_rate_hz: 2_000_000,
            sample_format: SampleFormat::I16,
            byte_order: ByteOrder::native(),
            pack: false,
            compression: Compression::None,
            output_path: PathBuf::from("recording.rfcap"),
            duration_secs: None,
            max_samples: None,
            chunk_samples: 4_096,
            ring_capacity: 64, // 64 * 4096 * 4 ~ 1 Мб
            realtime: true,
            stats_interval_secs: 5,
        }
    }
}

/// Парсит строку частоты в герцы.
///
/// Поддерживает суффиксы: `GHz`, `MHz`, `kHz`, `Hz` (регистронезависимо).
///
/// # Примеры
/// ```
/// use rfcap_cli::config::parse_freq_hz;
/// assert_eq!(parse_freq_hz("1602MHz").unwrap(), 1_602_000_000);
/// assert_eq!(parse_freq_hz("1.09GHz").unwrap(), 1_090_000_000);
/// assert_eq!(parse_freq_hz("2000000").unwrap(), 2_000_000);
/// ```
pub fn parse_freq_hz(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower.strip_suffix("ghz") {
        (v.trim(), 1_000_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("mhz") {
        (v.trim(), 1_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("khz") {
        (v.trim(), 1_000_f64)
    } else if let Some(v) = lower.strip_suffix("hz") {
        (v.trim(), 1_f64)
    } else {
        // Без суффикса: число в герцах
        return s
            .parse::<u64>()
            .map_err(|e| format!("Invalid frequency '{s}': {e}"));
    };

    let n: f64 = num_str
        .parse()
        .map_err(|e| format!("Invalid frequency value '{num_str}': {e}"))?;

    if !n.is_finite() || n < 0.0 {
        return Err(format!("Invalid frequency value '{num_str}'"));
    }

    Ok((n * mult).round() as u64)
}

/// Парсит частоту дискретизации (должна помещаться в u32).
pub fn parse_rate_hz(s: &str) -> Result<u32, String> {
    let hz = parse_freq_hz(s)?;

    u32::try_from(hz).map_err(|_| format!("Sample rate {hz} Hz exceeds u32::MAX"))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_freq_hz() {
        assert_eq!(parse_freq_hz("1602MHz").unwrap(), 1_602_000_000);
        assert_eq!(parse_freq_hz("1.602GHz").unwrap(), 1_602_000_000);
        assert_eq!(parse_freq_hz("2000kHz").unwrap(), 2_000_000);
        assert_eq!(parse_freq_hz("2000000Hz").unwrap(), 2_000_000);
        assert_eq!(parse_freq_hz("2000000").unwrap(), 2_000_000);
        assert!(parse_freq_hz("abc").is_err());
        assert!(parse_freq_hz("-5MHz").is_err());
    }

    #[test]
    fn test_parse_rate_hz_overflow() {
        assert_eq!(parse_rate_hz("2.4MHz").unwrap(), 2_400_000);
        assert!(parse_rate_hz("5GHz").is_err());
    }

    #[test]
    fn test_validate_pack_requires_i16() {
        let mut cfg = RecordConfig {
            pack: true,
            ..RecordConfig::default()
        };
        assert!(cfg.validate().is_ok());

        cfg.sample_format = SampleFormat::C64;
        assert!(matches!(cfg.validate(), Err(CliError::InvalidArgument(_))));

        // Чанк не обязан быть кратен группе упаковки
        cfg.sample_format = SampleFormat::I16;
        cfg.chunk_samples = 4_095;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_sample_limit_aligned_for_pack() {
        let mut cfg = RecordConfig {
            max_samples: Some(10),
            ..RecordConfig::default()
        };
        assert_eq!(cfg.sample_limit(), Some(10));

        cfg.pack = true;
        assert_eq!(cfg.sample_limit(), Some(8));
    }
}
