//! Пример: чтение rfcap файла и сводка по сигналу
//!
//! Использование: `cargo run -p rfcap-core --example read_rfcap_file [PATH] [--lz4]`

use std::{env, fs::File};

use rfcap_core::RfcapReader;
use rfcap_types::{Compression, Samples};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let lz4 = args.iter().any(|a| a == "--lz4");
    let input_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "tone.rfcap".to_string());

    let compression = if lz4 { Compression::Lz4 } else { Compression::None };
    let mut reader = RfcapReader::with_compression(File::open(&input_path)?, compression)?;

    let h = reader.header().summary();
    println!("Заголовок: {}", h.magic);
    println!("  Center freq : {} Hz", h.center_frequency_hz);
    println!("  Sample rate : {} Hz", h.sample_rate);
    println!("  Format      : {} (packed={})", h.sample_format, h.compressed);
    println!("  Byte order  : {}", h.byte_order);

    let mut buf = Samples::new(reader.header().sample_format, 16_384)?;
    let mut peak = 0i32;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }

        // Пик амплитуды для целочисленных форматов
        if let Some(iq) = buf.as_i16() {
            for s in &iq[..n] {
                peak = peak.max((s[0] as i32).abs()).max((s[1] as i32).abs());
            }
        }
    }

    let samples = reader.samples_read();
    let secs = samples as f64 / reader.header().sample_rate.max(1) as f64;
    println!("Прочитано: {samples} samples ({secs:.3}s)");
    if peak > 0 {
        println!("  Peak |I|,|Q| : {peak}");
    }

    Ok(())
}
