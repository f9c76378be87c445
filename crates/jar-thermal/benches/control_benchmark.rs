use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jar_thermal::control::{leaky_step, PowerController};
use jar_thermal::filter::{MedianFilter, MovingAverageFilter};
use jar_thermal::phase::firing_delay;

fn bench_control_path(c: &mut Criterion) {
    let ctl = PowerController::new(0.3_f32);

    c.bench_function("power_rate", |b| {
        b.iter(|| ctl.power_rate(black_box(62.0), black_box(58.5), black_box(0.4)))
    });

    c.bench_function("firing_delay", |b| {
        b.iter(|| firing_delay(black_box(10_000.0_f32), black_box(0.37)))
    });

    c.bench_function("sample_pipeline", |b| {
        let mut median: MedianFilter<u16, 5> = MedianFilter::new();
        let mut average: MovingAverageFilter<f32, 10> = MovingAverageFilter::new();
        let mut integral = 0.0_f32;
        let mut n: u16 = 0;
        b.iter(|| {
            n = n.wrapping_add(7);
            if let Some(m) = median.push(500 + (n % 13)) {
                if let Some(mean) = average.push(m as f32) {
                    integral = leaky_step(integral, black_box(60.0 - mean / 10.0), 0.01);
                }
            }
        })
    });
}

criterion_group!(benches, bench_control_path);
criterion_main!(benches);
