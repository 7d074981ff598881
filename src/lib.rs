//! Bounded, lock-free job queues for spin-based runtimes.
//!
//! Two variants share one slot layout and claim protocol:
//!
//! - [`spmc`] — a single producer thread, any number of consumer threads.
//!   Submission is a plain store; no producer-side RMW.
//! - [`mpmc`] — any number of producers and consumers. Producers linearize
//!   by CAS and stay safe against same-core interrupt reentrancy.
//!
//! Jobs are closures (`FnOnce() + Send + 'static`) written in place into
//! cache-line-sized ring slots — up to [`JOB_BYTES`] of captured state, no
//! allocation on submission or dispatch. Each slot carries a 32-bit sequence
//! that encodes its lap and which side owns it; producers and consumers hand
//! slots back and forth through release/acquire pairs on that field alone.
//! A `completed` counter, isolated on its own cache line, lets a producer
//! spin until quiescence ([`wait_idle`](spmc::Producer::wait_idle)) with all
//! job side effects visible on return.
//!
//! There are no locks, no condition variables and no syscalls anywhere;
//! every wait is a spin with [`cpu::pause`]. `try_add` hands the job back in
//! [`Full`] when the ring is saturated, and `run_next` returns `false` when
//! nothing is claimable — neither is an error, both mean "try again later".
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let (producer, worker) = jobring::spmc::new::<256>();
//! let counter = Arc::new(AtomicU32::new(0));
//!
//! for _ in 0..16 {
//!     let counter = Arc::clone(&counter);
//!     producer.add(move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     });
//! }
//!
//! while worker.run_next() {}
//! producer.wait_idle();
//! assert_eq!(counter.load(Ordering::Relaxed), 16);
//! ```

use core::fmt;

pub mod cpu;
pub mod mpmc;
pub mod spmc;

mod ring;
mod slot;
mod sync;

pub use slot::JOB_BYTES;

/// The queue was full; the rejected job is handed back untouched.
///
/// Not an error from the queue's point of view — retry or back off at the
/// caller's own cadence, or let `add` spin for you.
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Recovers the rejected job.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is full")
    }
}
