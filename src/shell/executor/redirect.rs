use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use log::{debug, warn};
use nix::unistd::{close, dup, dup2};
use thiserror::Error;

use super::error::describe_io;
use crate::shell::parser::ast::{Redirect, SimpleCommand};

const STDIN: RawFd = libc::STDIN_FILENO;
const STDOUT: RawFd = libc::STDOUT_FILENO;
const STDERR: RawFd = libc::STDERR_FILENO;

#[derive(Debug, Error)]
#[error("{path}: {}", describe_io(.source))]
pub struct RedirectError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

impl RedirectError {
    fn new(path: &str, source: io::Error) -> Self {
        Self {
            path: path.to_string(),
            source,
        }
    }
}

fn open_target(redirect: &Redirect) -> Result<File, RedirectError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if redirect.append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options
        .open(&redirect.path)
        .map_err(|e| RedirectError::new(&redirect.path, e))
}

/// Files opened for one leaf's redirections, not yet attached to any stream.
#[derive(Debug, Default)]
pub struct OpenedRedirects {
    input: Option<File>,
    output: Option<File>,
    error: Option<File>,
    error_shares_output: bool,
}

impl OpenedRedirects {
    /// Opens input first, then output, then error. When output and error name
    /// the same path the file is opened once, with the output's mode.
    pub fn open(cmd: &SimpleCommand) -> Result<Self, RedirectError> {
        let mut opened = Self::default();

        if let Some(path) = &cmd.input {
            let file = File::open(path).map_err(|e| RedirectError::new(path, e))?;
            opened.input = Some(file);
        }

        if let Some(output) = &cmd.output {
            opened.output = Some(open_target(output)?);
        }

        if cmd.shares_output_and_error() {
            opened.error_shares_output = true;
        } else if let Some(error) = &cmd.error {
            opened.error = Some(open_target(error)?);
        }

        Ok(opened)
    }

    fn targets(&self) -> Vec<(RawFd, RawFd)> {
        let mut targets = Vec::with_capacity(3);
        if let Some(file) = &self.input {
            targets.push((file.as_raw_fd(), STDIN));
        }
        if let Some(file) = &self.output {
            targets.push((file.as_raw_fd(), STDOUT));
            if self.error_shares_output {
                targets.push((file.as_raw_fd(), STDERR));
            }
        }
        if let Some(file) = &self.error {
            targets.push((file.as_raw_fd(), STDERR));
        }
        targets
    }

    /// Permanently attaches the files to the standard streams. Used in a
    /// freshly forked child right before exec. The original descriptors are
    /// closed when `self` is dropped.
    pub fn attach(self) -> nix::Result<()> {
        for (fd, stream) in self.targets() {
            dup2(fd, stream)?;
        }
        Ok(())
    }

    /// Attaches the files for as long as the returned guard lives. Used by
    /// builtins running inside the shell process.
    pub fn attach_scoped(self) -> nix::Result<StdioGuard> {
        let _ = io::stdout().flush();
        let mut guard = StdioGuard { saved: Vec::new() };
        for (fd, stream) in self.targets() {
            if !guard.saved.iter().any(|&(s, _)| s == stream) {
                let copy = dup(stream)?;
                guard.saved.push((stream, copy));
            }
            dup2(fd, stream)?;
        }
        Ok(guard)
    }
}

/// Restores the standard streams replaced by [`OpenedRedirects::attach_scoped`].
#[derive(Debug)]
pub struct StdioGuard {
    saved: Vec<(RawFd, RawFd)>,
}

impl Drop for StdioGuard {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        for &(stream, copy) in self.saved.iter().rev() {
            if let Err(e) = dup2(copy, stream) {
                warn!("failed to restore fd {}: {}", stream, e);
            }
            let _ = close(copy);
        }
        debug!("restored {} standard stream(s)", self.saved.len());
    }
}
