use criterion::measurement::WallTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_complex::Complex64;
use qamp::Complex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// custom criterion configuration for all benchmarks
// this allows for setting global parameters like sample size and measurement time
fn custom_criterion_config() -> Criterion<WallTime> {
    Criterion::default()
        .sample_size(200) // 20-30 recommended for dev, very inaccurate
        .measurement_time(std::time::Duration::from_secs(5)) // 1-2s for dev, very inaccurate
        .warm_up_time(std::time::Duration::from_secs(2))
        .with_plots() // enables generating plot data
}

// deterministic amplitude buffer so runs are comparable across machines
fn amplitude_buffer(len: usize, seed: u64) -> Vec<Complex> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect()
}

fn reference_buffer(amps: &[Complex]) -> Vec<Complex64> {
    amps.iter().map(|&c| Complex64::from(c)).collect()
}

fn complex_op_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("complex_ops");

    // buffer sizes based on build configuration
    // for faster development runs (debug mode), use smaller buffers
    #[cfg(debug_assertions)]
    let sizes = vec![1 << 10, 1 << 14];

    #[cfg(not(debug_assertions))]
    let sizes = vec![1 << 10, 1 << 14, 1 << 18, 1 << 20];

    for &size in &sizes {
        let a = amplitude_buffer(size, 0xA);
        let b = amplitude_buffer(size, 0xB);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("mul", size), &size, |bench, _| {
            bench.iter(|| {
                let mut acc = Complex::zero();
                for (&x, &y) in a.iter().zip(b.iter()) {
                    acc += black_box(x) * black_box(y);
                }
                acc
            })
        });

        group.bench_with_input(BenchmarkId::new("div", size), &size, |bench, _| {
            bench.iter(|| {
                let mut acc = Complex::zero();
                for (&x, &y) in a.iter().zip(b.iter()) {
                    acc += black_box(x) / black_box(y);
                }
                acc
            })
        });

        group.bench_with_input(BenchmarkId::new("norm_sqr", size), &size, |bench, _| {
            bench.iter(|| {
                let mut total = 0.0;
                for &x in a.iter() {
                    total += black_box(x).norm_sqr();
                }
                total
            })
        });

        group.bench_with_input(BenchmarkId::new("scale", size), &size, |bench, _| {
            bench.iter(|| {
                let mut acc = Complex::zero();
                for &x in a.iter() {
                    acc += black_box(x) * 0.707;
                }
                acc
            })
        });

        // the scalar reference type, to keep an eye on the speedup
        let ra = reference_buffer(&a);
        let rb = reference_buffer(&b);

        group.bench_with_input(
            BenchmarkId::new("mul_num_complex", size),
            &size,
            |bench, _| {
                bench.iter(|| {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (&x, &y) in ra.iter().zip(rb.iter()) {
                        acc += black_box(x) * black_box(y);
                    }
                    acc
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("div_num_complex", size),
            &size,
            |bench, _| {
                bench.iter(|| {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (&x, &y) in ra.iter().zip(rb.iter()) {
                        acc += black_box(x) / black_box(y);
                    }
                    acc
                })
            },
        );
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = custom_criterion_config();
    targets = complex_op_benchmarks
}
criterion_main!(benches);
