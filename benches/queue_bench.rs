use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::RngCore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

const JOBS: u32 = 100_000;

fn bench_single_thread_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_cycle");
    group.throughput(Throughput::Elements(u64::from(JOBS)));

    group.bench_function("spmc", |b| {
        let (producer, worker) = jobring::spmc::new::<1024>();
        let counter = Arc::new(AtomicU64::new(0));
        b.iter(|| {
            for _ in 0..JOBS {
                let counter = Arc::clone(&counter);
                producer.add(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
                worker.run_next();
            }
            producer.wait_idle();
            black_box(counter.load(Ordering::Relaxed));
        });
    });

    group.bench_function("mpmc", |b| {
        let (producer, worker) = jobring::mpmc::new::<1024>();
        let counter = Arc::new(AtomicU64::new(0));
        b.iter(|| {
            for _ in 0..JOBS {
                let counter = Arc::clone(&counter);
                producer.add(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
                worker.run_next();
            }
            producer.wait_idle();
            black_box(counter.load(Ordering::Relaxed));
        });
    });

    group.finish();
}

fn bench_one_producer_four_consumers(c: &mut Criterion) {
    let mut group = c.benchmark_group("1p_4c");
    group.throughput(Throughput::Elements(u64::from(JOBS)));

    group.bench_function("spmc", |b| {
        b.iter(|| {
            let (producer, worker) = jobring::spmc::new::<1024>();
            let counter = Arc::new(AtomicU64::new(0));
            let stop = Arc::new(AtomicBool::new(false));

            let consumers: Vec<_> = (0..4)
                .map(|_| {
                    let worker = worker.clone();
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || {
                        while !stop.load(Ordering::Relaxed) {
                            if !worker.run_next() {
                                std::hint::spin_loop();
                            }
                        }
                    })
                })
                .collect();

            for _ in 0..JOBS {
                let counter = Arc::clone(&counter);
                producer.add(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
            producer.wait_idle();
            stop.store(true, Ordering::Relaxed);
            for handle in consumers {
                handle.join().unwrap();
            }
            black_box(counter.load(Ordering::Relaxed));
        });
    });

    group.finish();
}

fn bench_four_by_four_hash_jobs(c: &mut Criterion) {
    let mut group = c.benchmark_group("4p_4c_hash");
    group.throughput(Throughput::Elements(u64::from(JOBS)));

    group.bench_function("mpmc", |b| {
        let seed = rand::rng().next_u64();
        b.iter(|| {
            let (producer, worker) = jobring::mpmc::new::<1024>();
            let sink = Arc::new(AtomicU64::new(0));
            let stop = Arc::new(AtomicBool::new(false));

            let consumers: Vec<_> = (0..4)
                .map(|_| {
                    let worker = worker.clone();
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || {
                        while !stop.load(Ordering::Relaxed) {
                            if !worker.run_next() {
                                std::hint::spin_loop();
                            }
                        }
                    })
                })
                .collect();

            let producers: Vec<_> = (0..4)
                .map(|p| {
                    let producer = producer.clone();
                    let sink = Arc::clone(&sink);
                    thread::spawn(move || {
                        for j in 0..JOBS / 4 {
                            let sink = Arc::clone(&sink);
                            let payload = seed ^ (u64::from(p as u32) << 32) ^ u64::from(j);
                            producer.add(move || {
                                let mut val = payload;
                                for i in 0..32u64 {
                                    val = (val << 5).wrapping_add(val).wrapping_add(i);
                                }
                                sink.fetch_add(val, Ordering::Relaxed);
                            });
                        }
                    })
                })
                .collect();

            for handle in producers {
                handle.join().unwrap();
            }
            producer.wait_idle();
            stop.store(true, Ordering::Relaxed);
            for handle in consumers {
                handle.join().unwrap();
            }
            black_box(sink.load(Ordering::Relaxed));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_cycle,
    bench_one_producer_four_consumers,
    bench_four_by_four_hash_jobs
);
criterion_main!(benches);
