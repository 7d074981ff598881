//! One-cache-line ring slot with in-place, type-erased job storage.
//!
//! # Layout
//!
//! ```text
//! +--------------------------------+----------+----------+--------+
//! | data (job bytes)               | func     | sequence | pad    |
//! | 48 B                           | 8 B      | 4 B      | 4 B    |
//! +--------------------------------+----------+----------+--------+
//! |<----------------------- 64 B, align 64 --------------------->|
//! ```
//!
//! `data` holds the job value itself, written in place at submission.
//! `func` is a monomorphized thunk that knows the concrete job type and
//! either runs-and-destroys it or destroys it without running (teardown).
//! `sequence` encodes the slot's lap and which side currently owns it; it is
//! the only field both producers and consumers write.
//!
//! `data` sits at offset zero so the slot's 64-byte alignment carries over
//! to the job value; any job with alignment up to a cache line is storable.

use core::mem::{self, MaybeUninit};

use crate::cpu::CACHE_LINE_SIZE;
use crate::sync::atomic::AtomicU32;
use crate::sync::cell::UnsafeCell;

/// What the caller wants the thunk to do with the stored job.
pub(crate) enum SlotOp {
    /// Move the job out, run it, destroy it.
    Run,
    /// Destroy the job without running it. Teardown only.
    Drop,
}

/// Type-erased entry point stored in a slot.
pub(crate) type SlotFn = unsafe fn(*mut u8, SlotOp);

/// Bytes available for the job value inside one slot.
pub const JOB_BYTES: usize =
    CACHE_LINE_SIZE - mem::size_of::<SlotFn>() - 2 * mem::size_of::<u32>();

/// Monomorphized thunk for a concrete job type.
unsafe fn thunk<F: FnOnce()>(data: *mut u8, op: SlotOp) {
    match op {
        SlotOp::Run => {
            // Moves the job out of the slot; its destructor runs when the
            // call returns, exactly once per submission.
            let job = unsafe { data.cast::<F>().read() };
            job();
        }
        SlotOp::Drop => unsafe { data.cast::<F>().drop_in_place() },
    }
}

#[repr(C, align(64))]
pub(crate) struct Slot {
    data: UnsafeCell<[MaybeUninit<u8>; JOB_BYTES]>,
    func: UnsafeCell<MaybeUninit<SlotFn>>,
    /// Lap/ownership state. See the ring module for the full state machine.
    pub(crate) sequence: AtomicU32,
    _pad: u32,
}

#[cfg(not(loom))]
const _: () = {
    assert!(mem::size_of::<Slot>() == CACHE_LINE_SIZE);
    assert!(mem::align_of::<Slot>() == CACHE_LINE_SIZE);
};

// SAFETY: access to `data` and `func` is handed between threads by the
// acquire/release protocol on `sequence`; exactly one side owns the cells at
// any time. Job values are required to be Send at submission.
unsafe impl Send for Slot {}
unsafe impl Sync for Slot {}

impl Slot {
    pub(crate) fn new(sequence: u32) -> Self {
        Self {
            data: UnsafeCell::new([MaybeUninit::uninit(); JOB_BYTES]),
            func: UnsafeCell::new(MaybeUninit::uninit()),
            sequence: AtomicU32::new(sequence),
            _pad: 0,
        }
    }

    /// Writes `job` and its thunk into the slot body.
    ///
    /// The job is moved directly into the ring; no caller-side temporary
    /// survives. Size and alignment limits are compile-time checks, so an
    /// oversized job type fails the build, not the call.
    ///
    /// # Safety
    ///
    /// The caller must own the slot (its sequence equals the caller's
    /// submission index) and must publish with a release store to
    /// `sequence` afterward.
    pub(crate) unsafe fn fill<F: FnOnce()>(&self, job: F) {
        const {
            assert!(
                mem::size_of::<F>() <= JOB_BYTES,
                "job does not fit in a queue slot",
            );
            assert!(
                mem::align_of::<F>() <= CACHE_LINE_SIZE,
                "job alignment exceeds slot alignment",
            );
        }
        self.data.with_mut(|p| unsafe { p.cast::<F>().write(job) });
        self.func
            .with_mut(|p| unsafe { p.write(MaybeUninit::new(thunk::<F> as SlotFn)) });
    }

    /// Runs and destroys the job stored in the slot.
    ///
    /// # Safety
    ///
    /// The caller must have claimed the slot (successful CAS on the claim
    /// index after observing the published sequence with acquire), and the
    /// slot must hold a job written by [`fill`](Self::fill).
    pub(crate) unsafe fn run(&self) {
        let func = self.func.with(|p| unsafe { (*p).assume_init() });
        self.data
            .with_mut(|p| unsafe { func(p.cast::<u8>(), SlotOp::Run) });
    }

    /// Destroys the stored job without running it.
    ///
    /// # Safety
    ///
    /// Exclusive access required (queue teardown), and the slot must hold a
    /// job that was published but never claimed.
    pub(crate) unsafe fn drop_job(&self) {
        let func = self.func.with(|p| unsafe { (*p).assume_init() });
        self.data
            .with_mut(|p| unsafe { func(p.cast::<u8>(), SlotOp::Drop) });
    }
}
