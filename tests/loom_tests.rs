//! Exhaustive interleaving models of the slot handoff protocol.
//!
//! Run with: RUSTFLAGS="--cfg loom" cargo test --release --test loom_tests
#![cfg(loom)]

use loom::sync::Arc;
use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::thread;

#[test]
fn spmc_two_jobs_hand_off_to_one_worker() {
    loom::model(|| {
        let (producer, worker) = jobring::spmc::new::<2>();
        let counter = Arc::new(AtomicUsize::new(0));

        let consumer = {
            let worker = worker.clone();
            thread::spawn(move || {
                let mut ran = 0;
                while ran < 2 {
                    if worker.run_next() {
                        ran += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        };

        for _ in 0..2 {
            let counter = Arc::clone(&counter);
            producer.add(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }

        // All job side effects must be visible once idle.
        producer.wait_idle();
        assert_eq!(counter.load(Ordering::Relaxed), 2);

        consumer.join().unwrap();
    });
}

#[test]
fn mpmc_two_producers_linearize_submissions() {
    loom::model(|| {
        let (producer, worker) = jobring::mpmc::new::<2>();
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let producer = producer.clone();
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                producer.add(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }));
        }

        let mut ran = 0;
        while ran < 2 {
            if worker.run_next() {
                ran += 1;
            } else {
                thread::yield_now();
            }
        }

        for handle in handles {
            handle.join().unwrap();
        }
        producer.wait_idle();
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    });
}

#[test]
fn mpmc_producer_and_consumer_race_on_a_tiny_ring() {
    loom::model(|| {
        let (producer, worker) = jobring::mpmc::new::<2>();
        let counter = Arc::new(AtomicUsize::new(0));

        let submitter = {
            let producer = producer.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..3 {
                    let counter = Arc::clone(&counter);
                    // Blocking add: exercises the full-queue path against a
                    // concurrently claiming worker.
                    producer.add(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    });
                }
            })
        };

        let mut ran = 0;
        while ran < 3 {
            if worker.run_next() {
                ran += 1;
            } else {
                thread::yield_now();
            }
        }

        submitter.join().unwrap();
        producer.wait_idle();
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    });
}

#[test]
fn full_ring_rejects_until_a_claim_frees_a_slot() {
    loom::model(|| {
        let (producer, worker) = jobring::mpmc::new::<2>();

        assert!(producer.try_add(|| {}).is_ok());
        assert!(producer.try_add(|| {}).is_ok());
        assert!(producer.try_add(|| {}).is_err());

        assert!(worker.run_next());
        assert!(producer.try_add(|| {}).is_ok());

        let mut ran = 0;
        while ran < 2 {
            assert!(worker.run_next());
            ran += 1;
        }
        producer.wait_idle();
        assert!(!worker.run_next());
    });
}
