//! Criterion benchmarks for the simulation driver and router.
//!
//! Run with:
//!   cargo bench -p probviz
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use probviz::prelude::*;

struct Coin;

impl Trial for Coin {
    type Outcome = bool;
    type Statistic = (u64, u64, Vec<f64>);

    fn sample(&self, rng: &mut Prng) -> bool {
        rng.gen_bool(0.5)
    }

    fn fold(&self, (heads, tosses, history): &mut Self::Statistic, head: bool) {
        *heads += head as u64;
        *tosses += 1;
        history.push(*heads as f64 / *tosses as f64);
    }
}

/// Full run, tick by tick, at varying target counts.
fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver_run");

    for target in [100u64, 1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*target));

        group.bench_with_input(BenchmarkId::new("coin", target), target, |b, &target| {
            let mut scheduler = ManualScheduler::new();
            let mut driver = SimulationDriver::new(Coin, 42);

            b.iter(|| {
                driver
                    .start(target as i64, &mut scheduler)
                    .expect("positive target");
                while driver.is_running() {
                    driver.tick(&mut scheduler);
                }
                black_box(driver.statistic().0)
            });
        });
    }

    group.finish();
}

/// Timer dispatch through the virtual clock.
fn bench_scheduler_dispatch(c: &mut Criterion) {
    c.bench_function("scheduler_dispatch_1000", |b| {
        let mut scheduler = ManualScheduler::new();
        let mut driver = SimulationDriver::new(Coin, 7);

        b.iter(|| {
            driver.start(1_000, &mut scheduler).expect("positive target");
            scheduler.advance_by(TICK_INTERVAL * 60);
            while let Some(token) = scheduler.next_fired() {
                driver.on_timer(token, &mut scheduler);
            }
            black_box(driver.samples_drawn())
        });
    });
}

/// Re-activation cost once every page is built.
fn bench_router_activate(c: &mut Criterion) {
    let mut router: Router<String> = Router::new();
    for i in 0..12 {
        let topic = format!("topic_{i}");
        for &page in PageKey::all() {
            let name = format!("{topic}/{page}");
            router
                .register_page(topic.clone(), page, move || Ok(name.clone()))
                .expect("unique registration");
        }
    }

    c.bench_function("router_activate_warm", |b| {
        b.iter(|| {
            for i in 0..12 {
                let page = router
                    .activate(&format!("topic_{i}"), PageKey::Experiment)
                    .expect("registered route");
                black_box(page.len());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_full_run,
    bench_scheduler_dispatch,
    bench_router_activate
);
criterion_main!(benches);
