//! CPU-level knobs the queues depend on: the spin hint and the cache-line
//! size used for slot and counter layout.

/// Cache line size assumed by the slot layout, in bytes.
///
/// Almost all modern x86_64 and aarch64 parts use 64-byte lines. The constant
/// is centralized here because the slot body size is derived from it; a
/// platform with wider lines gets a wider slot body, not a different
/// algorithm.
pub const CACHE_LINE_SIZE: usize = 64;

/// Hint to the CPU that the caller is in a spin loop.
///
/// This is the only throttling mechanism in the crate: `add` uses it while
/// the queue is full, `wait_idle` while work is in flight, and consumer
/// loops are expected to use it after an empty `run_next`. It has no
/// observable effect besides reduced contention on the hyperthread sibling
/// and the memory bus.
#[cfg(not(loom))]
#[inline(always)]
pub fn pause() {
    core::hint::spin_loop();
}

/// Under loom the hint must yield to the model scheduler, otherwise a spin
/// loop starves every other modeled thread and the exploration never ends.
#[cfg(loom)]
#[inline(always)]
pub fn pause() {
    loom::thread::yield_now();
}
