use std::fmt::Display;
use std::io::{self, Write};

use nix::errno::Errno;
use thiserror::Error;

/// Status for builtin validation errors, redirect failures and children
/// killed by a signal.
pub const EXIT_FAILURE: i32 = 1;
/// The program was found but could not be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// The program could not be located on `PATH`.
pub const EXIT_NOT_FOUND: i32 = 127;

/// A process-level primitive failed. The session cannot continue.
///
/// Command failures are never reported through this type: they travel up the
/// tree as plain exit statuses.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),
    #[error("pipe creation failed: {0}")]
    Channel(#[source] nix::Error),
    #[error("waitpid failed: {0}")]
    Wait(#[source] nix::Error),
}

pub type ExecStatus = Result<i32, ExecError>;

/// Writes a one-line `minish: ...` diagnostic straight to file descriptor 2,
/// wherever it currently points.
pub fn report(message: impl Display) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "minish: {}", message);
    let _ = stderr.flush();
}

/// `strerror`-style text for an I/O error, without the `(os error N)` suffix.
pub fn describe_io(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_io_strips_os_code() {
        let err = io::Error::from_raw_os_error(libc::ENOENT);
        assert_eq!(describe_io(&err), "No such file or directory");
    }

    #[test]
    fn test_describe_io_custom_error() {
        let err = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(describe_io(&err), "boom");
    }
}
