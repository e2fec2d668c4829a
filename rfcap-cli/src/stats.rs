//! Счётчики сессии записи и итоговый отчёт.
//!
//! Объём считается на двух уровнях: байты кодека полезной нагрузки (то, что
//! занимали бы выборки в файле без упаковки и LZ4) и байты, реально
//! дошедшие до файла. Их отношение показывает выигрыш от nibble-упаковки и
//! LZ4 на конкретном сигнале.

use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use rfcap_core::HEADER_SIZE;
use rfcap_types::{Compression, Header, RfcapResult};

/// Счётчики, общие для потоков захвата и записи.
#[derive(Debug, Default)]
pub struct CaptureStats {
    /// Выборок получено от приёмника
    pub captured: AtomicU64,
    /// Выборок потеряно: переполнение канала и неполная группа упаковки
    pub lost: AtomicU64,
    /// Выборок принято писателем rfcap
    pub written: AtomicU64,
    /// Байт, дошедших до файла (вместе с заголовком)
    pub file_bytes: AtomicU64,
}

impl CaptureStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Снимок счётчиков для заголовка `header`.
    pub fn report(
        &self,
        header: &Header,
        compression: Compression,
        elapsed: Duration,
    ) -> RfcapResult<CaptureReport> {
        Ok(CaptureReport {
            sample_rate: header.sample_rate,
            bytes_per_sample: header.sample_format.bytes_per_sample()? as u64,
            packed: header.compressed,
            compression,
            elapsed,
            captured: self.captured.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            file_bytes: self.file_bytes.load(Ordering::Relaxed),
        })
    }
}

/// Обёртка над файлом, считающая записанные байты.
pub struct CountingWriter<W: Write> {
    inner: W,
    stats: Arc<CaptureStats>,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(
        inner: W,
        stats: Arc<CaptureStats>,
    ) -> Self {
        Self { inner, stats }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.stats.file_bytes.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Итог сессии записи.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReport {
    pub sample_rate: u32,
    pub bytes_per_sample: u64,
    pub packed: bool,
    pub compression: Compression,
    pub elapsed: Duration,
    pub captured: u64,
    pub lost: u64,
    pub written: u64,
    pub file_bytes: u64,
}

impl CaptureReport {
    /// Байт полезной нагрузки до упаковки и LZ4.
    pub fn codec_bytes(&self) -> u64 {
        self.written * self.bytes_per_sample
    }

    /// Байт полезной нагрузки на диске.
    pub fn stored_bytes(&self) -> u64 {
        self.file_bytes.saturating_sub(HEADER_SIZE as u64)
    }

    /// Доля занимаемого места после упаковки и LZ4 (1.0 = без выигрыша).
    pub fn storage_ratio(&self) -> f64 {
        let codec = self.codec_bytes();

        if codec == 0 {
            return 0.0;
        }

        self.stored_bytes() as f64 / codec as f64
    }

    /// Процент потерянных выборок от полученных.
    pub fn loss_pct(&self) -> f64 {
        if self.captured == 0 {
            return 0.0;
        }

        self.lost as f64 / self.captured as f64 * 100.0
    }

    /// Длительность записанного сигнала.
    pub fn signal_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }

        self.written as f64 / self.sample_rate as f64
    }

    /// Во сколько раз запись шла быстрее реального времени.
    pub fn realtime_factor(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.signal_secs() / secs
    }
}

impl std::fmt::Display for CaptureReport {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(
            f,
            "  Signal        : {} samples, {:.3}s ({:.1}x realtime)",
            self.written,
            self.signal_secs(),
            self.realtime_factor()
        )?;
        writeln!(
            f,
            "  Lost          : {} of {} ({:.2}%)",
            self.lost,
            self.captured,
            self.loss_pct()
        )?;
        write!(
            f,
            "  Storage       : {:.2} MB codec -> {:.2} MB on disk ({:.1}%, packed={}, {})",
            self.codec_bytes() as f64 / 1e6,
            self.stored_bytes() as f64 / 1e6,
            self.storage_ratio() * 100.0,
            self.packed,
            self.compression,
        )
    }
}
