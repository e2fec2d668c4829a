//! Пример: запись 12-битного тона в rfcap файл с nibble-упаковкой
//!
//! Использование: `cargo run -p rfcap-core --example write_rfcap_file [PATH]`

use std::{env, f32::consts::PI, fs::File};

use rfcap_core::RfcapWriter;
use rfcap_types::{ByteOrder, Header, SampleFormat, Samples};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = env::args().nth(1).unwrap_or_else(|| "tone.rfcap".to_string());

    let sample_rate = 2_000_000u32;
    let mut header = Header::new(1_602_000_000.0, sample_rate, SampleFormat::I16);
    header.byte_order = Some(ByteOrder::Little);
    header.compressed = true;

    let mut writer = RfcapWriter::new(File::create(&output_path)?, header)?;

    // Тон 25 кГц, значения выровнены по старшим 12 битам
    let tone_hz = 25_000.0f32;
    let chunk = 50_000usize;
    for c in 0..10 {
        let iq: Vec<[i16; 2]> = (0..chunk)
            .map(|i| {
                let t = (c * chunk + i) as f32 / sample_rate as f32;
                let phase = 2.0 * PI * tone_hz * t;
                let i_val = (2_000.0 * phase.cos()) as i16;
                let q_val = (2_000.0 * phase.sin()) as i16;
                [i_val << 4, q_val << 4]
            })
            .collect();

        writer.write(&Samples::I16(iq))?;
    }

    let total = writer.samples_written();
    let file = writer.finish()?;
    let size = file.metadata()?.len();

    println!("Записано: {output_path}");
    println!("  Samples : {total}");
    println!("  Size    : {size} bytes ({} without packing)", 48 + total * 4);

    Ok(())
}
