//! The process-wide DWARF serialization lock (§4.2, §5, §9).
//!
//! `gimli`'s reader is reentrant and thread-safe in the Rust implementation,
//! unlike the LLVM DWARF context the source system is built around — but
//! the design explicitly treats single-threaded execution as a hard
//! contract of the *interface*, not an accident of one particular parser,
//! so every extraction call still serializes on a process-wide mutex. A
//! future swap to a non-reentrant backend (or a shared native dependency)
//! does not change any caller's code.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static DWARF_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Runs `f` while holding the process-wide DWARF lock.
///
/// Every public entry point in this crate goes through this function.
/// Callers must never call into this crate recursively from within `f`,
/// even on the same thread, since `parking_lot::Mutex` is not reentrant.
pub fn serialized<T>(f: impl FnOnce() -> T) -> T {
    let _guard = DWARF_LOCK.lock();
    f()
}
