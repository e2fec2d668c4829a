//! "Открыть и прочитать до конца": бенчмарк пути чтения.

use std::{
    fs::File,
    path::Path,
    time::{Duration, Instant},
};

use log::{debug, info};
use rfcap_core::RfcapReader;
use rfcap_types::{Compression, Header, Samples};

use crate::CliResult;

/// Результат одного прохода по файлу.
#[derive(Debug, Clone)]
pub struct DrainReport {
    /// Чем читали (`sync`, `uring`)
    pub method: &'static str,
    pub header: Header,
    pub samples: u64,
    /// Байт полезной нагрузки после распаковки LZ4
    pub bytes: u64,
    pub elapsed: Duration,
}

impl DrainReport {
    pub fn throughput_msps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.samples as f64 / secs / 1_000_000.0
    }

    pub fn throughput_mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.bytes as f64 / secs / 1_000_000.0
    }

    /// Длительность записи в секундах по частоте дискретизации.
    pub fn capture_secs(&self) -> f64 {
        if self.header.sample_rate == 0 {
            return 0.0;
        }

        self.samples as f64 / self.header.sample_rate as f64
    }
}

impl std::fmt::Display for DrainReport {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}: {} samples ({:.3}s of signal) in {:.3}s, {:.2} Msps, {:.1} MB/s",
            self.method,
            self.samples,
            self.capture_secs(),
            self.elapsed.as_secs_f64(),
            self.throughput_msps(),
            self.throughput_mbps(),
        )
    }
}

/// Читает файл целиком синхронным [`RfcapReader`].
pub fn drain_sync(
    path: &Path,
    compression: Compression,
    chunk_samples: usize,
) -> CliResult<DrainReport> {
    let start = Instant::now();

    let mut reader = RfcapReader::with_compression(File::open(path)?, compression)?;
    let header = reader.header().clone();
    let bytes_per_sample = header.sample_format.bytes_per_sample()? as u64;

    let mut buf = Samples::new(header.sample_format, chunk_samples)?;
    loop {
        if reader.read(&mut buf)? == 0 {
            break;
        }
    }

    let samples = reader.samples_read();
    debug!("sync drain of {path:?} finished: {samples} samples");

    Ok(DrainReport {
        method: "sync",
        header,
        samples,
        bytes: samples * bytes_per_sample,
        elapsed: start.elapsed(),
    })
}

/// Читает полезную нагрузку через io_uring без декодирования.
///
/// Упакованные файлы считаются в распакованных выборках, байты в упакованных.
#[cfg(all(target_os = "linux", feature = "uring"))]
pub fn drain_uring(
    path: &Path,
    opts: rfcap_core::UringOptions,
) -> CliResult<DrainReport> {
    use rfcap_core::UringReader;

    let start = Instant::now();

    let mut reader = UringReader::new(File::open(path)?, opts)?;
    let header = reader.header().clone();

    let mut bytes = 0u64;
    let mut samples = 0u64;
    while reader.read_next()? {
        bytes += reader.buffer().len() as u64;
        samples += reader.samples_in_buffer() as u64;
    }

    debug!("uring drain of {path:?} finished: {bytes} bytes");

    Ok(DrainReport {
        method: "uring",
        header,
        samples,
        bytes,
        elapsed: start.elapsed(),
    })
}

/// Логирует отчёт в формате, общем для всех методов.
pub fn log_report(report: &DrainReport) {
    info!("{report}");
}
