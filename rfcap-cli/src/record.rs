use std::{
    fs::File,
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{RecvTimeoutError, Sender, TrySendError};
use log::{info, warn};
use rfcap_core::{header_from_sdr, RfcapWriter};
use rfcap_types::{Receiver, RfcapResult, SampleFormat, Samples};

use crate::{
    stats::{CaptureReport, CaptureStats, CountingWriter},
    CliError, CliResult, RecordConfig,
};

type CaptureWriter = RfcapWriter<CountingWriter<File>>;

/// Оркестрирует сессию записи: поток захвата → канал → поток записи.
pub struct RecordingPipeline {
    config: RecordConfig,
    stats: Arc<CaptureStats>,
    stop_flag: Arc<AtomicBool>,
}

impl RecordingPipeline {
    pub fn new(config: RecordConfig) -> Self {
        Self {
            config,
            stats: CaptureStats::new(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Флаг остановки. Устанавливается в `true` для graceful shutdown.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Живые счётчики сессии.
    pub fn stats(&self) -> Arc<CaptureStats> {
        self.stats.clone()
    }

    /// Запускает запись. Блокируется до завершения и возвращает итог.
    pub fn run<D: Receiver + Send>(
        self,
        device: &mut D,
    ) -> CliResult<CaptureReport> {
        self.config.validate()?;

        if device.sample_format() != self.config.sample_format {
            return Err(CliError::InvalidArgument(format!(
                "device produces {} samples, configuration asks for {}",
                device.sample_format(),
                self.config.sample_format
            )));
        }

        let mut header = header_from_sdr(device)?;
        header.byte_order = Some(self.config.byte_order);
        header.compressed = self.config.pack;

        let hw = device.hardware_info();
        info!(
            "Starting recording: {} {} @ {} Hz, center={} Hz",
            hw.manufacturer, hw.product, header.sample_rate, header.center_frequency
        );
        info!(
            "Output: {:?}, duration: {:?}, max samples: {:?}",
            self.config.output_path,
            self.config.duration_secs,
            self.config.sample_limit()
        );

        header.validate()?;
        let file = CountingWriter::new(
            File::create(&self.config.output_path)?,
            self.stats.clone(),
        );
        let writer = RfcapWriter::with_compression(file, header.clone(), self.config.compression)?;

        let (tx, rx) = crossbeam_channel::bounded::<Samples>(self.config.ring_capacity);
        let stop_flag = self.stop_flag.clone();
        let session_start = Instant::now();

        thread::scope(|s| {
            let capture_stop = stop_flag.clone();
            let capture_stats = self.stats.clone();
            let chunk = self.config.chunk_samples;
            let format = self.config.sample_format;

            let capture = s.spawn(move || {
                let result = capture_loop(device, format, chunk, tx, &capture_stats, &capture_stop);

                if let Err(ref e) = result {
                    warn!("Capture thread error: {e}");
                }

                result
            });

            // Цикл записи (текущий поток)
            let writer_result = self.writer_loop(writer, rx, &session_start);

            // Сигнализируем потоку захвата остановиться
            stop_flag.store(true, Ordering::Relaxed);

            match capture.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Capture thread finished with error: {e}"),
                Err(_) => warn!("Capture thread panicked"),
            }

            writer_result
        })?;

        let report = self
            .stats
            .report(&header, self.config.compression, session_start.elapsed())?;

        Ok(report)
    }

    fn writer_loop(
        &self,
        mut writer: CaptureWriter,
        rx: crossbeam_channel::Receiver<Samples>,
        session_start: &Instant,
    ) -> CliResult<()> {
        let cfg = &self.config;
        let stats = &self.stats;

        let limit = cfg.sample_limit();
        let recv_timeout = Duration::from_millis(100);
        let stats_interval = Duration::from_secs(cfg.stats_interval_secs);
        let mut last_stats = Instant::now();

        loop {
            if let Some(dur) = cfg.duration_secs {
                if session_start.elapsed().as_secs() >= dur {
                    info!("Duration limit reached ({dur}s). Finalizing...");
                    break;
                }
            }

            if let Some(max) = limit {
                if writer.samples_written() >= max {
                    info!("Sample limit reached ({max}). Finalizing...");
                    break;
                }
            }

            // Внешний stop_flag (Ctrl+C)
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop signal received. Finalizing...");
                break;
            }

            let mut chunk = match rx.recv_timeout(recv_timeout) {
                Ok(c) => c,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Capture channel closed. Flushing...");
                    break;
                }
            };

            // Предел выровнен на группу упаковки, неполные группы между
            // чанками копит сам упаковщик
            if let Some(max) = limit {
                let room = (max - writer.samples_written()) as usize;
                if chunk.len() > room {
                    stats
                        .lost
                        .fetch_add((chunk.len() - room) as u64, Ordering::Relaxed);
                    chunk.truncate(room);
                }
            }

            writer.write(&chunk)?;
            stats
                .written
                .store(writer.samples_written(), Ordering::Relaxed);

            if last_stats.elapsed() >= stats_interval {
                log_progress(stats, session_start);
                last_stats = Instant::now();
            }
        }

        let tail = writer.discard_partial_group()?;
        if tail > 0 {
            warn!("Dropping {tail} samples that do not fill a pack group");
            stats.lost.fetch_add(tail as u64, Ordering::Relaxed);
        }

        let samples = writer.samples_written();
        stats.written.store(samples, Ordering::Relaxed);
        writer.finish()?.flush()?;

        info!("File finalized: {:?} ({samples} samples)", cfg.output_path);
        Ok(())
    }
}

fn log_progress(
    stats: &CaptureStats,
    start: &Instant,
) {
    info!(
        "[ {:.0}s ] captured={} written={} lost={} file={:.1}MB",
        start.elapsed().as_secs_f64(),
        stats.captured.load(Ordering::Relaxed),
        stats.written.load(Ordering::Relaxed),
        stats.lost.load(Ordering::Relaxed),
        stats.file_bytes.load(Ordering::Relaxed) as f64 / 1e6,
    );
}

/// Читает приёмник чанками до остановки или конца потока.
fn capture_loop<D: Receiver>(
    device: &mut D,
    format: SampleFormat,
    chunk_samples: usize,
    tx: Sender<Samples>,
    stats: &CaptureStats,
    stop_flag: &AtomicBool,
) -> RfcapResult<()> {
    let mut rx = device.start_rx()?;

    while !stop_flag.load(Ordering::Relaxed) {
        let mut buf = Samples::new(format, chunk_samples)?;

        let n = rx.read(&mut buf)?;
        if n == 0 {
            break;
        }
        buf.truncate(n);
        stats.captured.fetch_add(n as u64, Ordering::Relaxed);

        match tx.try_send(buf) {
            Ok(()) => {}
            Err(TrySendError::Full(c)) => {
                stats.lost.fetch_add(c.len() as u64, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    rx.close()
}
