//! Facade over the atomic and cell primitives the queues are built on.
//!
//! Every load, store, CAS and fetch-add in this crate goes through these
//! types with an explicit [`Ordering`] at the call site. Under `cfg(loom)`
//! they resolve to loom's checked versions so the whole claim/publish
//! protocol runs under exhaustive interleaving exploration unchanged; in a
//! normal build they are the `core`/`std` primitives with zero overhead.
//!
//! The `UnsafeCell` wrapper exposes loom's closure-based `with`/`with_mut`
//! access API in both modes, so slot reads and writes are written once.

#[cfg(loom)]
pub(crate) mod atomic {
    pub(crate) use loom::sync::atomic::{AtomicU32, Ordering};
}

#[cfg(not(loom))]
pub(crate) mod atomic {
    pub(crate) use core::sync::atomic::{AtomicU32, Ordering};
}

#[cfg(loom)]
pub(crate) mod cell {
    pub(crate) use loom::cell::UnsafeCell;
}

#[cfg(not(loom))]
pub(crate) mod cell {
    /// `loom::cell::UnsafeCell`-shaped wrapper over the real thing.
    #[derive(Debug)]
    pub(crate) struct UnsafeCell<T>(core::cell::UnsafeCell<T>);

    impl<T> UnsafeCell<T> {
        pub(crate) const fn new(data: T) -> UnsafeCell<T> {
            UnsafeCell(core::cell::UnsafeCell::new(data))
        }

        #[inline(always)]
        pub(crate) fn with<R>(&self, f: impl FnOnce(*const T) -> R) -> R {
            f(self.0.get())
        }

        #[inline(always)]
        pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
            f(self.0.get())
        }
    }
}
