//! # Blocking Bridge
//!
//! Lets synchronous code wait on the crate's async operations, such as
//! streaming body buffering.
//!
//! - Inside a Tokio runtime the wait happens in place via `block_in_place`
//!   and the caller's own handle, so futures bound to that runtime (spawned
//!   tasks, hyper bodies fed by a connection task) still complete.
//! - Outside any runtime a shared fallback runtime drives the future.
//!
//! Blocking forms belong on blocking threads: `spawn_blocking`, the
//! [`blocking`](crate::routes::blocking) handler wrapper, or a multi-thread
//! worker. Calling them from a task on a current-thread runtime panics
//! instead of stalling the only worker.

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Handle, Runtime};

static FALLBACK: OnceLock<Runtime> = OnceLock::new();

/// Shared runtime used when the caller is outside any runtime
///
/// # Panics
///
/// Panics if the runtime cannot be created (the process is out of threads
/// or file descriptors).
pub fn fallback_runtime() -> &'static Runtime {
    FALLBACK.get_or_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("routekit-bridge")
            .enable_all()
            .build()
            .expect("Failed to build routekit bridge runtime")
    })
}

/// Block the current thread until `future` completes
///
/// Panics raised by the future are re-raised on the caller's thread.
///
/// # Panics
///
/// Panics when called from a task running on a current-thread runtime.
/// Move the call onto a blocking thread first.
pub fn wait<F: Future>(future: F) -> F::Output {
    match Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        Err(_) => fallback_runtime().block_on(future),
    }
}
