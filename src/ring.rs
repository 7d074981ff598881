//! Ring state shared by both queue variants: the slot array, the three
//! counters, the consumer algorithm and the idle accounting.
//!
//! # Slot state machine
//!
//! Each slot's `sequence` advances through the values
//! `i, i+1, i+1+N, i+2N, ...` where `i` is the slot's ring position and `N`
//! the capacity:
//!
//! ```text
//! sequence == h      slot empty, owned by the producer for index h
//! sequence == h + 1  slot full, claimable by consumers
//! sequence == h + N  slot empty again, next lap
//! ```
//!
//! Producers publish a slot by storing `h + 1` with release after writing
//! the job; the consumer that wins the CAS on `tail` runs the job and hands
//! the slot back by storing `h + N` with release. Readiness checks use the
//! signed 32-bit difference so they stay correct across `u32` wrap; in-flight
//! counts use unsigned wrapping subtraction for the same reason.
//!
//! `head`, `tail` and `completed` each live on their own cache line so that
//! producer-side polling of `completed` (in `wait_idle`) and producer reads
//! of `head` never bounce the consumer-owned claim line.

use crossbeam_utils::CachePadded;

use crate::cpu;
use crate::slot::Slot;
use crate::sync::atomic::{AtomicU32, Ordering};

/// Signed distance from `expected` to `seq`, valid across `u32` wrap.
///
/// Zero means the slot is in exactly the state the caller expects, negative
/// means the slot has not reached it yet, positive means the caller's view
/// of the index is stale.
#[inline(always)]
pub(crate) fn seq_diff(seq: u32, expected: u32) -> i32 {
    seq.wrapping_sub(expected) as i32
}

pub(crate) struct Ring<const N: usize> {
    slots: Box<[Slot; N]>,
    /// Submission index. SPMC: written by the single producer with relaxed
    /// stores; MPMC: claimed by CAS. Read by inspectors.
    pub(crate) head: CachePadded<AtomicU32>,
    /// Claim index, advanced by consumers via CAS.
    tail: CachePadded<AtomicU32>,
    /// Count of jobs whose run has returned, bumped by consumers.
    completed: CachePadded<AtomicU32>,
}

impl<const N: usize> Ring<N> {
    pub(crate) const MASK: u32 = N as u32 - 1;
    pub(crate) const LAP: u32 = N as u32;

    pub(crate) fn new() -> Self {
        const {
            assert!(
                N >= 2 && N.is_power_of_two(),
                "queue capacity must be a power of two and at least 2",
            );
            assert!(N <= 1 << 31, "queue capacity must fit the 32-bit counters");
        }

        let mut slots = Vec::with_capacity(N);
        for i in 0..N {
            slots.push(Slot::new(i as u32));
        }
        let slots: Box<[Slot; N]> = match slots.into_boxed_slice().try_into() {
            Ok(slots) => slots,
            Err(_) => unreachable!(),
        };

        Self {
            slots,
            head: CachePadded::new(AtomicU32::new(0)),
            tail: CachePadded::new(AtomicU32::new(0)),
            completed: CachePadded::new(AtomicU32::new(0)),
        }
    }

    #[inline(always)]
    pub(crate) fn slot(&self, index: u32) -> &Slot {
        &self.slots[(index & Self::MASK) as usize]
    }

    /// Zeroes the counters and reseeds every slot's sequence.
    ///
    /// Requires a quiescent queue: idle (`wait_idle` has returned) and no
    /// producer mid-submission. Workers may keep polling `run_next` while
    /// this runs: in the idle state every sequence is congruent to its ring
    /// position mod N, and so is every value written here, so no mix of old
    /// and new values can satisfy a claim check.
    pub(crate) fn init(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        for (i, slot) in self.slots.iter().enumerate() {
            slot.sequence.store(i as u32, Ordering::Relaxed);
        }
    }

    /// Claims and runs the next published job, if any.
    pub(crate) fn run_next(&self) -> bool {
        let mut t = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = self.slot(t);
            // Pairs with the producer's release publish of the slot.
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq_diff(seq, t.wrapping_add(1));

            if diff < 0 {
                // Slot at `tail` not published yet. Not proof of emptiness,
                // only that nothing is claimable at this instant.
                return false;
            }
            if diff > 0 {
                // Stale view of `tail`: other consumers already advanced
                // past this index. Refresh and retry.
                t = self.tail.load(Ordering::Relaxed);
                continue;
            }

            // Weak CAS: spurious failure just retries the loop. Relaxed on
            // both sides; the acquire above already ordered the job bytes.
            match self.tail.compare_exchange_weak(
                t,
                t.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // SAFETY: the CAS claimed index `t` exclusively, and the
                    // acquire on `sequence` made the slot contents visible.
                    unsafe { slot.run() };
                    // Hand the slot to the producer for the next lap.
                    slot.sequence
                        .store(t.wrapping_add(Self::LAP), Ordering::Release);
                    // Pairs with the acquire in `wait_idle`; publishes the
                    // job's side effects along with the count.
                    self.completed.fetch_add(1, Ordering::Release);
                    return true;
                }
                Err(current) => t = current,
            }
        }
    }

    /// Submissions minus completions. Advisory; unordered against in-flight
    /// state changes.
    #[inline]
    pub(crate) fn active_count(&self) -> u32 {
        self.head
            .load(Ordering::Relaxed)
            .wrapping_sub(self.completed.load(Ordering::Relaxed))
    }

    /// Spins until every job submitted so far has finished running.
    ///
    /// The acquire on `completed` pairs with the release bump in `run_next`,
    /// so all side effects of the finished jobs are visible on return.
    pub(crate) fn wait_idle(&self) {
        loop {
            let head = self.head.load(Ordering::Relaxed);
            if head == self.completed.load(Ordering::Acquire) {
                return;
            }
            cpu::pause();
        }
    }

    /// Rewinds all counters to `base` (a multiple of N) and reseeds the
    /// sequences to match, as if `base` jobs had already passed through.
    /// Lets tests exercise `u32` counter wrap without submitting four
    /// billion jobs.
    #[cfg(test)]
    pub(crate) fn rewind_to(&self, base: u32) {
        debug_assert_eq!(base % Self::LAP, 0);
        self.head.store(base, Ordering::Relaxed);
        self.tail.store(base, Ordering::Relaxed);
        self.completed.store(base, Ordering::Relaxed);
        for (i, slot) in self.slots.iter().enumerate() {
            slot.sequence
                .store(base.wrapping_add(i as u32), Ordering::Relaxed);
        }
    }
}

impl<const N: usize> Drop for Ring<N> {
    fn drop(&mut self) {
        // Exclusive access: destroy any job that was published but never
        // claimed. Destructor only; the body does not run.
        let head = self.head.load(Ordering::Relaxed);
        let mut t = self.tail.load(Ordering::Relaxed);
        while t != head {
            let slot = self.slot(t);
            if slot.sequence.load(Ordering::Relaxed) == t.wrapping_add(1) {
                // SAFETY: `&mut self` rules out concurrent claims, and the
                // sequence check proves the slot holds an unclaimed job.
                unsafe { slot.drop_job() };
            }
            t = t.wrapping_add(1);
        }
    }
}
