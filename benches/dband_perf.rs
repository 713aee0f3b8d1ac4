// benches/dband_perf.rs
// Criterion benchmarks for the banded fill (both traceback encodings), the
// adaptive driver and parallel batch alignment.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use ferrous_dband::align_opt::AlignOpt;
use ferrous_dband::alignment::{
    align_adaptive, align_batch, align_in_band, AdaptiveTarget, Band, Eoplist, GapCosts, Reservoir,
    SubstitutionMatrix, TraceEncoding,
};

fn make_pair(rng: &mut StdRng, len: usize) -> (Vec<u8>, Vec<u8>) {
    let u: Vec<u8> = (0..len).map(|_| rng.gen_range(0..4)).collect();
    // ~5% substitutions, ~2% single-base indels
    let mut v = Vec::with_capacity(len + len / 20);
    for &c in &u {
        match rng.gen_range(0..100) {
            0 => {}
            1 => {
                v.push(c);
                v.push(rng.gen_range(0..4));
            }
            2..=6 => v.push((c + 1) % 4),
            _ => v.push(c),
        }
    }
    (u, v)
}

fn bench_fixed_band(c: &mut Criterion) {
    let mut group = c.benchmark_group("dband_fixed");
    let model = SubstitutionMatrix::nucleotide(1, 1, -1).unwrap();
    let costs = GapCosts::new(2, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);

    for (len, width) in [(150usize, 10usize), (1000, 50), (5000, 100)] {
        let (u, v) = make_pair(&mut rng, len);
        let band = Band::clamped(width.max(u.len().abs_diff(v.len())), u.len(), v.len()).unwrap();
        group.throughput(Throughput::Elements(band.cell_count() as u64));

        group.bench_function(format!("score_only_len{len}_w{width}"), |b| {
            let mut reservoir = Reservoir::new(TraceEncoding::PackedBits);
            b.iter(|| {
                align_in_band(&mut reservoir, None, &model, &costs, black_box(&u), black_box(&v), &band)
                    .unwrap()
            })
        });

        for encoding in [TraceEncoding::FullScores, TraceEncoding::PackedBits] {
            group.bench_function(format!("{encoding:?}_len{len}_w{width}"), |b| {
                let mut reservoir = Reservoir::new(encoding);
                let mut ops = Eoplist::new();
                b.iter(|| {
                    align_in_band(
                        &mut reservoir,
                        Some(&mut ops),
                        &model,
                        &costs,
                        black_box(&u),
                        black_box(&v),
                        &band,
                    )
                    .unwrap()
                })
            });
        }
    }
    group.finish();
}

fn bench_adaptive(c: &mut Criterion) {
    let mut group = c.benchmark_group("dband_adaptive");
    let model = SubstitutionMatrix::nucleotide(1, 1, -1).unwrap();
    let costs = GapCosts::new(2, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    let (u, v) = make_pair(&mut rng, 2000);
    let target = AdaptiveTarget {
        expected_score: None,
        converge: true,
    };

    group.bench_function("converge_len2000", |b| {
        let mut reservoir = Reservoir::new(TraceEncoding::PackedBits);
        let mut ops = Eoplist::new();
        b.iter(|| {
            align_adaptive(&mut reservoir, Some(&mut ops), &model, &costs, black_box(&u), black_box(&v), &target)
                .unwrap()
        })
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dband_batch");
    let mut rng = StdRng::seed_from_u64(99);
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..512).map(|_| make_pair(&mut rng, 250)).collect();
    let opt = AlignOpt::default();
    group.throughput(Throughput::Elements(pairs.len() as u64));

    group.bench_function("pairs512_len250", |b| {
        b.iter(|| align_batch(black_box(&pairs), &opt).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_fixed_band, bench_adaptive, bench_batch);
criterion_main!(benches);
