use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use rfcap_cli::{
    drain_sync, log_report, parse_freq_hz, parse_rate_hz, CliResult, RecordConfig,
    RecordingPipeline, SimulatedReceiver,
};
use rfcap_core::{read_header, HEADER_SIZE};
use rfcap_types::{ByteOrder, Compression, SampleFormat, MIME_TYPE};

#[derive(Parser, Debug)]
#[command(
    name = "rfcap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect, benchmark and record rfcap I/Q captures",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Тихий режим (только ошибки)
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Подробный вывод (debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Показать заголовок файла
    Info {
        path: PathBuf,
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Прочитать файл целиком и измерить скорость
    Drain {
        path: PathBuf,
        /// Полезная нагрузка сжата LZ4
        #[arg(long)]
        lz4: bool,
        /// Дополнительно прочитать через io_uring (Linux, feature `uring`)
        #[arg(long)]
        uring: bool,
        /// Выборок в одном буфере чтения
        #[arg(long, default_value = "32768")]
        iq_length: usize,
        /// Размер блока io_uring, байт
        #[arg(long, default_value = "4096")]
        block_size: usize,
    },
    /// Записать сигнал симулятора в файл
    Record {
        /// Несущая частота (1602MHz, 1.602GHz, 1602000000)
        #[arg(short = 'f', long, default_value = "1602MHz")]
        freq: String,
        /// Частота дискретизации (2MHz, 2000000)
        #[arg(short = 'r', long, default_value = "2MHz")]
        rate: String,
        /// Формат выборок: u8, i8, i16, c64
        #[arg(long, default_value = "i16")]
        format: SampleFormat,
        /// Порядок байт: little, big, native
        #[arg(long, default_value = "native")]
        byte_order: ByteOrder,
        /// 12-битная упаковка (только i16)
        #[arg(long)]
        pack: bool,
        /// Сжатие: none, lz4
        #[arg(long, default_value = "none")]
        compress: Compression,
        /// Путь к выходному файлу
        #[arg(short, long, default_value = "recording.rfcap")]
        output: PathBuf,
        /// Ограничение записи (секунды). По умолчанию: до Ctrl+C
        #[arg(short, long)]
        duration: Option<u64>,
        /// Ограничение по числу выборок
        #[arg(long)]
        max_samples: Option<u64>,
        /// Выборок в чанке приёмника
        #[arg(long, default_value = "4096")]
        chunk_samples: usize,
        /// Ёмкость канала между потоками (в чанках)
        #[arg(long, default_value = "64")]
        ring_capacity: usize,
        /// Генерировать быстрее реального времени
        #[arg(long)]
        no_realtime: bool,
        /// Интервал вывода статистики (секунды)
        #[arg(long, default_value = "5")]
        stats_interval: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let result = match cli.command {
        Command::Info { path, json } => run_info(&path, json),
        Command::Drain {
            path,
            lz4,
            uring,
            iq_length,
            block_size,
        } => run_drain(&path, lz4, uring, iq_length, block_size),
        Command::Record {
            freq,
            rate,
            format,
            byte_order,
            pack,
            compress,
            output,
            duration,
            max_samples,
            chunk_samples,
            ring_capacity,
            no_realtime,
            stats_interval,
        } => build_record_config(&freq, &rate).and_then(|(center_freq_hz, sample_rate_hz)| {
            run_record(RecordConfig {
                center_freq_hz,
                sample_rate_hz,
                sample_format: format,
                byte_order,
                pack,
                compression: compress,
                output_path: output,
                duration_secs: duration,
                max_samples,
                chunk_samples,
                ring_capacity,
                realtime: !no_realtime,
                stats_interval_secs: stats_interval,
            })
        }),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn build_record_config(
    freq: &str,
    rate: &str,
) -> CliResult<(u64, u32)> {
    let center = parse_freq_hz(freq)
        .map_err(|e| rfcap_cli::CliError::InvalidArgument(format!("--freq: {e}")))?;
    let rate = parse_rate_hz(rate)
        .map_err(|e| rfcap_cli::CliError::InvalidArgument(format!("--rate: {e}")))?;

    Ok((center, rate))
}

fn run_info(
    path: &Path,
    json: bool,
) -> CliResult<()> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let header = read_header(&mut file)?;
    let summary = header.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let payload = file_len.saturating_sub(HEADER_SIZE as u64);

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  File          : {}", path.display());
    println!("  Type          : {} ({MIME_TYPE})", summary.magic);
    match summary.capture_time_ns {
        Some(ns) => println!("  Capture time  : {ns} ns since epoch"),
        None => println!("  Capture time  : out of range"),
    }
    println!("  Center freq   : {:.3} MHz", summary.center_frequency_hz / 1e6);
    println!("  Sample rate   : {:.3} Msps", summary.sample_rate as f64 / 1e6);
    println!("  Format        : {}", summary.sample_format);
    println!("  Byte order    : {}", summary.byte_order);
    println!("  Packed        : {}", summary.compressed);
    println!("  Payload       : {payload} bytes");

    // Длительность известна только для несжатых файлов
    if let Ok(bps) = header.sample_format.bytes_per_sample() {
        let mut samples = payload / bps as u64;
        if header.compressed {
            samples = samples / 3 * 4;
        }
        if header.sample_rate > 0 {
            println!(
                "  Duration      : {:.3}s if not LZ4-compressed ({samples} samples)",
                samples as f64 / header.sample_rate as f64
            );
        }
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    Ok(())
}

fn run_drain(
    path: &Path,
    lz4: bool,
    uring: bool,
    iq_length: usize,
    block_size: usize,
) -> CliResult<()> {
    let compression = if lz4 { Compression::Lz4 } else { Compression::None };

    let report = drain_sync(path, compression, iq_length)?;
    log_report(&report);

    if uring {
        run_drain_uring(path, lz4, iq_length, block_size)?;
    }

    Ok(())
}

#[cfg(all(target_os = "linux", feature = "uring"))]
fn run_drain_uring(
    path: &Path,
    lz4: bool,
    iq_length: usize,
    block_size: usize,
) -> CliResult<()> {
    if lz4 {
        warn!("io_uring reader does not decode LZ4 frames, skipping");
        return Ok(());
    }

    let opts = rfcap_core::UringOptions {
        block_size,
        iq_length,
        ..Default::default()
    };
    let report = rfcap_cli::drain_uring(path, opts)?;
    log_report(&report);

    Ok(())
}

#[cfg(not(all(target_os = "linux", feature = "uring")))]
fn run_drain_uring(
    _path: &Path,
    _lz4: bool,
    _iq_length: usize,
    _block_size: usize,
) -> CliResult<()> {
    warn!("Compiled without io_uring support. Rebuild with: cargo build --features uring");
    Ok(())
}

fn run_record(config: RecordConfig) -> CliResult<()> {
    let mut device = SimulatedReceiver::new(
        config.center_freq_hz as f64,
        config.sample_rate_hz,
        config.sample_format,
    );
    device.realtime = config.realtime;

    let output = config.output_path.clone();
    let bytes_per_sample = config.sample_format.bytes_per_sample()?;
    let data_rate_mbs = config.sample_rate_hz as f64 * bytes_per_sample as f64 / 1_000_000.0;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Device        : simulated");
    info!("  Center freq   : {:.3} MHz", config.center_freq_hz as f64 / 1e6);
    info!("  Sample rate   : {:.3} Msps", config.sample_rate_hz as f64 / 1e6);
    info!("  Format        : {} ({bytes_per_sample} B/sample)", config.sample_format);
    info!("  Byte order    : {}", config.byte_order);
    info!("  Packed        : {}", config.pack);
    info!("  Compression   : {}", config.compression);
    info!("  Data rate     : {:.1} MB/s", data_rate_mbs);
    info!("  Output        : {:?}", output);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let pipeline = RecordingPipeline::new(config);
    let stop_flag: Arc<AtomicBool> = pipeline.stop_flag();

    let stop_ctrlc = stop_flag.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C: принудительный выход
            warn!("Force exit");
            std::process::exit(130);
        }
        warn!("Ctrl+C received, finalizing file...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    let report = pipeline.run(&mut device)?;
    info!("\n{report}");

    if report.lost > 0 {
        warn!(
            "{} samples lost ({:.2}%). Consider: larger --ring-capacity or lower --rate",
            report.lost,
            report.loss_pct()
        );
    }

    info!("Recording complete: {:?}", output);
    Ok(())
}
