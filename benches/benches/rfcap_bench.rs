//! Бенчмарки упаковщика, кодека полезной нагрузки и полного стека записи.
//!
//! Запуск:
//!   cargo bench -p rfcap-benchmark --bench rfcap_bench

use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rfcap_benchmark::twelve_bit_tone;
use rfcap_core::{
    encode_samples, pack_iq, read_full, unpack_iq, RfcapReader, RfcapWriter,
};
use rfcap_types::{ByteOrder, Compression, Header, SampleFormat, Samples};

const IQ_LENGTH: usize = 32 * 1024;

fn bench_packer(c: &mut Criterion) {
    let mut group = c.benchmark_group("packer");
    group.throughput(Throughput::Elements(IQ_LENGTH as u64));

    let input = twelve_bit_tone(IQ_LENGTH);
    let mut packed = vec![[0i16; 2]; IQ_LENGTH / 4 * 3];
    let mut unpacked = vec![[0i16; 2]; IQ_LENGTH];

    group.bench_function("pack_iq", |b| {
        b.iter(|| pack_iq(black_box(&input), &mut packed))
    });

    if pack_iq(&input, &mut packed).is_ok() {
        group.bench_function("unpack_iq", |b| {
            b.iter(|| unpack_iq(black_box(&packed), &mut unpacked))
        });
    }

    group.finish();
}

fn bench_payload_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_encode");
    group.throughput(Throughput::Elements(IQ_LENGTH as u64));

    let i16_samples = Samples::I16(twelve_bit_tone(IQ_LENGTH));
    let c64_samples = Samples::C64(
        twelve_bit_tone(IQ_LENGTH)
            .iter()
            .map(|[i, q]| [*i as f32, *q as f32])
            .collect(),
    );
    let mut out = Vec::new();

    for order in [ByteOrder::Little, ByteOrder::Big] {
        group.bench_with_input(BenchmarkId::new("i16", order), &order, |b, &order| {
            b.iter(|| encode_samples(black_box(&i16_samples), order, &mut out))
        });
        group.bench_with_input(BenchmarkId::new("c64", order), &order, |b, &order| {
            b.iter(|| encode_samples(black_box(&c64_samples), order, &mut out))
        });
    }

    group.finish();
}

fn bench_stream_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_round_trip");
    group.throughput(Throughput::Elements(IQ_LENGTH as u64));
    group.sample_size(20);

    let input = Samples::I16(twelve_bit_tone(IQ_LENGTH));

    for (name, pack, compression) in [
        ("plain", false, Compression::None),
        ("packed", true, Compression::None),
        ("lz4", false, Compression::Lz4),
        ("packed_lz4", true, Compression::Lz4),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut header = Header::new(1_602_000_000.0, 2_000_000, SampleFormat::I16);
                header.compressed = pack;

                let mut writer =
                    RfcapWriter::with_compression(Vec::new(), header, compression).ok()?;
                writer.write(&input).ok()?;
                let raw = writer.finish().ok()?;

                let mut reader =
                    RfcapReader::with_compression(Cursor::new(raw), compression).ok()?;
                let mut out = Samples::new(SampleFormat::I16, IQ_LENGTH).ok()?;
                read_full(&mut reader, &mut out).ok()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_packer,
    bench_payload_codec,
    bench_stream_round_trip
);
criterion_main!(benches);
