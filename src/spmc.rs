//! Single-producer, multi-consumer job queue.
//!
//! The producer owns `head` outright: submission is a sequence check, an
//! in-place write and a release publish, with no atomic RMW on the hot path.
//! Any number of workers race on `tail` to claim published slots.
//!
//! # Thread safety
//!
//! - [`Producer`] is `Send + !Sync` and not `Clone`: exactly one thread at a
//!   time can submit, enforced by the type system. Handing the producer to
//!   another thread is fine; sharing it is a compile error.
//! - [`Worker`] is `Clone + Send + Sync`; spin up as many as you like.
//! - Submitting from an interrupt handler that preempted the producer is
//!   not safe in this variant; use the [`mpmc`](crate::mpmc) queue for that.

use core::cell::Cell;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::Full;
use crate::cpu;
use crate::ring::Ring;
use crate::sync::atomic::Ordering;

/// Creates a queue with `N` slots, returning the submission and dispatch
/// handles. `N` must be a power of two and at least 2 (compile-time check).
pub fn new<const N: usize>() -> (Producer<N>, Worker<N>) {
    let ring = Arc::new(Ring::new());
    (
        Producer {
            ring: Arc::clone(&ring),
            _single: PhantomData,
        },
        Worker { ring },
    )
}

/// Submission handle. One per queue; not cloneable.
pub struct Producer<const N: usize> {
    ring: Arc<Ring<N>>,
    /// Keeps the handle `!Sync` so a second producer thread cannot appear
    /// behind a shared reference.
    _single: PhantomData<Cell<()>>,
}

/// Dispatch handle; clone one per consumer thread.
#[derive(Clone)]
pub struct Worker<const N: usize> {
    ring: Arc<Ring<N>>,
}

impl<const N: usize> Producer<N> {
    /// Constructs `job` in place inside the next slot and publishes it.
    ///
    /// Returns the job back inside [`Full`] when all `N` slots are occupied
    /// by work that has not been claimed and finished; nothing is dropped.
    pub fn try_add<F>(&self, job: F) -> Result<(), Full<F>>
    where
        F: FnOnce() + Send + 'static,
    {
        let h = self.ring.head.load(Ordering::Relaxed);
        let slot = self.ring.slot(h);

        // Pairs with the worker's release hand-back of the slot. Anything
        // other than `h` means the slot is still owned by a previous lap.
        if slot.sequence.load(Ordering::Acquire) != h {
            return Err(Full(job));
        }

        // SAFETY: sequence == h hands this slot to the producer, and this
        // handle is the only producer.
        unsafe { slot.fill(job) };
        self.ring.head.store(h.wrapping_add(1), Ordering::Relaxed);
        // Publishes the job bytes and thunk; pairs with the acquire in the
        // workers' claim check.
        slot.sequence.store(h.wrapping_add(1), Ordering::Release);
        Ok(())
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
    /// has returned and with no submission in progress. Workers polling
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
        f.debug_struct("spmc::Producer")
            .field("capacity", &N)
            .field("active", &self.active_count())
            .finish()
    }
}
