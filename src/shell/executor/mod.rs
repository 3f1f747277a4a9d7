mod builtin;
pub mod context;
pub mod error;
mod executor;
pub mod launcher;
mod parallel;
mod pipeline;
mod redirect;

#[cfg(test)]
mod testing;

pub use error::ExecError;
pub use executor::Executor;

/// Serializes tests that fork or touch cwd / environment.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
