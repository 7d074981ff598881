//! Multi-producer, multi-consumer job queue.
//!
//! Producers linearize by CAS on `head`, consumers by CAS on `tail`. The
//! consumer path, accounting and teardown are shared with the SPMC variant;
//! only submission differs: a producer first claims its index, then writes
//! the slot, then publishes. Consumers gate on the published sequence, so a
//! half-written slot is never observable.
//!
//! # Interrupt reentrancy
//!
//! A producer may be preempted between its `head` claim and its publish by
//! an interrupt handler that itself submits to the same queue. The handler's
//! claim observes an already-advanced `head` and lands on a different slot,
//! so neither submission sees the other in an intermediate state. Consumers
//! simply cannot claim the interrupted slot until its publish completes.
//!
//! # Thread safety
//!
//! Both [`Producer`] and [`Worker`] are `Clone + Send + Sync`; clone one
//! handle per thread, or share one behind a reference.

use std::sync::Arc;

use crate::Full;
use crate::cpu;
use crate::ring::{Ring, seq_diff};
use crate::sync::atomic::Ordering;

/// Creates a queue with `N` slots, returning the submission and dispatch
/// handles. `N` must be a power of two and at least 2 (compile-time check).
pub fn new<const N: usize>() -> (Producer<N>, Worker<N>) {
    let ring = Arc::new(Ring::new());
    (
        Producer {
            ring: Arc::clone(&ring),
        },
        Worker { ring },
    )
}

/// Submission handle; clone one per producer thread.
#[derive(Clone)]
pub struct Producer<const N: usize> {
    ring: Arc<Ring<N>>,
}

/// Dispatch handle; clone one per consumer thread.
#[derive(Clone)]
pub struct Worker<const N: usize> {
    ring: Arc<Ring<N>>,
}

impl<const N: usize> Producer<N> {
    /// Claims a submission index, constructs `job` in place and publishes it.
    ///
    /// Returns the job back inside [`Full`] when every slot holds work that
    /// has not been claimed and finished; nothing is dropped. Safe to call
    /// from an interrupt handler that preempted another producer.
    pub fn try_add<F>(&self, job: F) -> Result<(), Full<F>>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut h = self.ring.head.load(Ordering::Relaxed);
        loop {
            let slot = self.ring.slot(h);
            // Pairs with the worker's release hand-back of the slot.
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq_diff(seq, h);

            if diff < 0 {
                // Slot still held by a consumer lap: the queue is full.
                return Err(Full(job));
            }
            if diff > 0 {
                // Another producer advanced past this index; refresh.
                h = self.ring.head.load(Ordering::Relaxed);
                continue;
            }

            // Weak CAS inside a retry loop; relaxed on both sides, the slot
            // handoff itself is ordered by `sequence`.
            match self.ring.head.compare_exchange_weak(
                h,
                h.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // SAFETY: the CAS claimed index `h` exclusively;
                    // consumers stay out until the publish below.
                    unsafe { slot.fill(job) };
                    // Publishes the job bytes and thunk; pairs with the
                    // acquire in the workers' claim check.
                    slot.sequence.store(h.wrapping_add(1), Ordering::Release);
                    return Ok(());
                }
                Err(current) => h = current,
            }
        }
    }

    /// Like [`try_add`](Self::try_add), but spins with the CPU pause hint
    /// until a slot frees up.
    pub fn add<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut job = job;
        loop {
            match self.try_add(job) {
                Ok(()) => return,
                Err(Full(returned)) => {
                    job = returned;
                    cpu::pause();
                }
            }
        }
    }

    /// Submissions minus completions. Advisory.
    pub fn active_count(&self) -> u32 {
        self.ring.active_count()
    }

    /// Spins until everything submitted so far has finished. On return, all
    /// side effects of those jobs are visible to this thread.
    pub fn wait_idle(&self) {
        self.ring.wait_idle();
    }

    /// Resets the queue to its freshly-created state.
    ///
    /// Call only on a quiescent queue: after [`wait_idle`](Self::wait_idle)
    /// has returned and with every producer quiescent. Workers polling
    /// [`Worker::run_next`] in a loop do not need to be stopped.
    pub fn init(&self) {
        self.ring.init();
    }

    /// Number of slots.
    pub const fn capacity(&self) -> u32 {
        N as u32
    }
}

impl<const N: usize> Worker<N> {
    /// Claims and runs the next published job.
    ///
    /// `false` means nothing was claimable at this instant, not that the
    /// queue is empty; callers typically pause and retry.
    pub fn run_next(&self) -> bool {
        self.ring.run_next()
    }

    /// Submissions minus completions. Advisory.
    pub fn active_count(&self) -> u32 {
        self.ring.active_count()
    }

    /// Spins until everything submitted so far has finished.
    pub fn wait_idle(&self) {
        self.ring.wait_idle();
    }

    /// Number of slots.
    pub const fn capacity(&self) -> u32 {
        N as u32
    }
}

impl<const N: usize> core::fmt::Debug for Producer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("mpmc::Producer")
            .field("capacity", &N)
            .field("active", &self.active_count())
            .finish()
    }
}
