//! Residual coding benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use transcode_cabac::{
    BinCounter, BinEncoder, CabacWriter, ContextModel, Plane, ResidualBlock, SbacConfig,
    SbacEncoder, SignHiding, SliceCodingState, SliceType,
};

/// Typical post-quantization block: dense low frequencies, sparse tail.
fn generate_block(size: usize) -> Vec<i32> {
    let mut seed = 0x2545_f491u32;
    let mut coeffs = vec![0i32; size * size];
    for y in 0..size {
        for x in 0..size {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let keep = (x + y) < size / 2 || seed % 8 == 0;
            if keep {
                let level = (seed >> 8) % (32 / (1 + x + y) as u32 + 1);
                coeffs[y * size + x] = if seed & 1 == 0 { level as i32 } else { -(level as i32) };
            }
        }
    }
    coeffs
}

fn config() -> SbacConfig {
    SbacConfig::new().with_sign_hiding(SignHiding::Disabled)
}

fn bench_encode_coeff(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_coeff_nxn");

    for size in [4u32, 8, 16, 32] {
        let coeffs = generate_block(size as usize);
        group.throughput(Throughput::Elements(u64::from(size * size)));

        group.bench_with_input(BenchmarkId::new("writer", size), &coeffs, |b, coeffs| {
            let mut enc = SbacEncoder::<CabacWriter>::with_config(config()).unwrap();
            enc.reset_entropy(SliceCodingState::new(SliceType::I, 32));
            b.iter(|| {
                let block = ResidualBlock::new(coeffs, size, Plane::Luma);
                black_box(enc.encode_coeff_nxn(&block).unwrap());
                enc.reset_bits();
            });
        });

        group.bench_with_input(BenchmarkId::new("counter", size), &coeffs, |b, coeffs| {
            let mut enc = SbacEncoder::<BinCounter>::with_config(config()).unwrap();
            enc.reset_entropy(SliceCodingState::new(SliceType::I, 32));
            b.iter(|| {
                let block = ResidualBlock::new(coeffs, size, Plane::Luma);
                black_box(enc.encode_coeff_nxn(&block).unwrap());
                enc.reset_bits();
            });
        });
    }

    group.finish();
}

fn bench_est_bits(c: &mut Criterion) {
    let mut enc = SbacEncoder::<BinCounter>::with_config(config()).unwrap();
    enc.reset_entropy(SliceCodingState::new(SliceType::P, 30));

    c.bench_function("est_bits_32x32", |b| {
        b.iter(|| black_box(enc.est_bits(5, Plane::Luma).unwrap()));
    });
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    let bins: Vec<bool> = (0..4096u32).map(|i| i.wrapping_mul(2_654_435_761) >> 29 == 0).collect();
    group.throughput(Throughput::Elements(bins.len() as u64));

    group.bench_function("regular_bins", |b| {
        b.iter(|| {
            let mut writer = CabacWriter::new();
            let mut ctx = ContextModel::new(32, 154);
            for &bin in &bins {
                writer.encode_bin(bin, &mut ctx).unwrap();
            }
            writer.finish().unwrap();
            black_box(writer.into_data())
        });
    });

    group.bench_function("bypass_bins", |b| {
        b.iter(|| {
            let mut writer = CabacWriter::new();
            for chunk in bins.chunks(16) {
                let value = chunk.iter().fold(0, |acc, &bin| (acc << 1) | u32::from(bin));
                writer.encode_bins_ep(value, chunk.len() as u32).unwrap();
            }
            writer.finish().unwrap();
            black_box(writer.into_data())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode_coeff, bench_est_bits, bench_engine);
criterion_main!(benches);
