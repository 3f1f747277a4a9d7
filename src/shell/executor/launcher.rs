use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use log::{debug, error, warn};
use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, pipe, ForkResult, Pid};

use super::builtin::Builtin;
use super::error::{
    report, ExecError, ExecStatus, EXIT_FAILURE, EXIT_NOT_EXECUTABLE, EXIT_NOT_FOUND,
};
use super::executor::Executor;
use super::redirect::OpenedRedirects;
use crate::shell::parser::ast::{CommandNode, Operator, SimpleCommand};

/// A child process that has not been waited for yet.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "every child must be waited for"]
pub struct ChildHandle {
    pub pid: Pid,
}

impl ChildHandle {
    pub fn new(pid: Pid) -> Self {
        Self { pid }
    }
}

/// How a child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Exited(i32),
    Signaled(i32),
}

impl ChildExit {
    /// Exit status as seen by the tree. Signal deaths collapse to
    /// [`EXIT_FAILURE`].
    pub fn status(&self) -> i32 {
        match *self {
            ChildExit::Exited(code) => code,
            ChildExit::Signaled(_) => EXIT_FAILURE,
        }
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self, ChildExit::Signaled(_))
    }

    pub fn success(&self) -> bool {
        *self == ChildExit::Exited(0)
    }
}

/// Both ends of an anonymous pipe. Dropping closes them.
#[derive(Debug)]
pub struct Channel {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

/// Descriptor plumbing a forked branch performs before evaluating its subtree:
/// duplicate onto stdin/stdout, then close every listed original.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Wiring {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    pub close: Vec<RawFd>,
}

impl Wiring {
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn pipe_writer(channel: &Channel) -> Self {
        Self {
            stdin: None,
            stdout: Some(channel.write.as_raw_fd()),
            close: vec![channel.read.as_raw_fd(), channel.write.as_raw_fd()],
        }
    }

    pub fn pipe_reader(channel: &Channel) -> Self {
        Self {
            stdin: Some(channel.read.as_raw_fd()),
            stdout: None,
            close: vec![channel.read.as_raw_fd(), channel.write.as_raw_fd()],
        }
    }

    fn apply(&self) -> nix::Result<()> {
        if let Some(fd) = self.stdin {
            dup2(fd, libc::STDIN_FILENO)?;
        }
        if let Some(fd) = self.stdout {
            dup2(fd, libc::STDOUT_FILENO)?;
        }
        for &fd in &self.close {
            if fd > libc::STDERR_FILENO {
                close(fd)?;
            }
        }
        Ok(())
    }
}

/// Process creation seam. The executor and the coordinators only talk to
/// processes through this trait.
pub trait Launcher {
    /// Starts the external program described by `cmd`.
    fn launch(&mut self, cmd: &SimpleCommand) -> Result<ChildHandle, ExecError>;

    /// Starts a child that applies `wiring`, evaluates `node` and exits with
    /// the resulting status.
    fn fork_subtree(
        &mut self,
        node: &CommandNode,
        depth: usize,
        parent: Operator,
        wiring: Wiring,
    ) -> Result<ChildHandle, ExecError>;

    fn channel(&mut self) -> Result<Channel, ExecError>;

    /// Blocks until `child` terminates.
    fn wait(&mut self, child: ChildHandle) -> Result<ChildExit, ExecError>;
}

/// The command a forked branch execs directly instead of evaluating: a leaf
/// that is neither empty nor a builtin. The branch's own exit is then the
/// program's, so a signal death stays visible to whoever waits for it.
pub fn external_leaf(node: &CommandNode) -> Option<&SimpleCommand> {
    match node {
        CommandNode::Leaf(cmd) if !cmd.verb.is_empty() && Builtin::lookup(cmd).is_none() => {
            Some(cmd)
        }
        _ => None,
    }
}

/// Runs one external command to completion.
pub fn run_simple<L: Launcher>(launcher: &mut L, cmd: &SimpleCommand) -> ExecStatus {
    let child = launcher.launch(cmd)?;
    let exit = launcher.wait(child)?;
    debug!("`{}` finished: {:?}", cmd.verb, exit);
    Ok(exit.status())
}

/// [`Launcher`] backed by `fork(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkLauncher;

impl Launcher for ForkLauncher {
    fn launch(&mut self, cmd: &SimpleCommand) -> Result<ChildHandle, ExecError> {
        // SAFETY: the child only sets up descriptors and then execs or exits.
        match unsafe { fork() }.map_err(ExecError::Fork)? {
            ForkResult::Parent { child } => {
                debug!("forked pid {} for `{}`", child, cmd.verb);
                Ok(ChildHandle::new(child))
            }
            ForkResult::Child => exec_simple(cmd),
        }
    }

    fn fork_subtree(
        &mut self,
        node: &CommandNode,
        depth: usize,
        parent: Operator,
        wiring: Wiring,
    ) -> Result<ChildHandle, ExecError> {
        // SAFETY: the child execs or evaluates its subtree and leaves through
        // `exit_child`.
        match unsafe { fork() }.map_err(ExecError::Fork)? {
            ForkResult::Parent { child } => {
                debug!("forked pid {} for {} under `{}`", child, node.label(), parent);
                Ok(ChildHandle::new(child))
            }
            ForkResult::Child => {
                if let Err(e) = wiring.apply() {
                    report(format_args!("cannot wire {} branch: {}", parent, e));
                    exit_child(EXIT_FAILURE);
                }
                if let Some(cmd) = external_leaf(node) {
                    exec_simple(cmd);
                }
                let status = match Executor::new(ForkLauncher).execute(node, depth, Some(parent)) {
                    Ok(status) => status,
                    Err(e) => {
                        error!("branch {} failed: {}", node.label(), e);
                        report(&e);
                        EXIT_FAILURE
                    }
                };
                exit_child(status)
            }
        }
    }

    fn channel(&mut self) -> Result<Channel, ExecError> {
        let (read, write) = pipe().map_err(ExecError::Channel)?;
        Ok(Channel { read, write })
    }

    fn wait(&mut self, child: ChildHandle) -> Result<ChildExit, ExecError> {
        loop {
            match waitpid(child.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(ChildExit::Exited(code)),
                Ok(WaitStatus::Signaled(pid, sig, _core_dumped)) => {
                    warn!("pid {} killed by {}", pid, sig);
                    return Ok(ChildExit::Signaled(sig as i32));
                }
                Ok(other) => debug!("pid {}: ignoring {:?}", child.pid, other),
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    error!("waitpid({}) failed: {}", child.pid, e);
                    return Err(ExecError::Wait(e));
                }
            }
        }
    }
}

/// Child side of [`ForkLauncher::launch`]: redirect, then replace the image.
fn exec_simple(cmd: &SimpleCommand) -> ! {
    // The shell ignores SIGPIPE; programs expect the default.
    // SAFETY: resetting to SIG_DFL installs no handler.
    let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };

    let redirects = match OpenedRedirects::open(cmd) {
        Ok(redirects) => redirects,
        Err(e) => {
            report(&e);
            exit_child(EXIT_FAILURE);
        }
    };
    if let Err(e) = redirects.attach() {
        report(format_args!("{}: {}", cmd.verb, e));
        exit_child(EXIT_FAILURE);
    }

    let (verb, argv) = match to_c_strings(cmd) {
        Some(strings) => strings,
        None => {
            report(format_args!("{}: argument contains a NUL byte", cmd.verb));
            exit_child(EXIT_FAILURE);
        }
    };

    let err = match execvp(&verb, &argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    let status = match err {
        Errno::ENOENT => {
            report(format_args!("{}: command not found", cmd.verb));
            EXIT_NOT_FOUND
        }
        e => {
            report(format_args!("{}: {}", cmd.verb, e.desc()));
            EXIT_NOT_EXECUTABLE
        }
    };
    exit_child(status)
}

fn to_c_strings(cmd: &SimpleCommand) -> Option<(CString, Vec<CString>)> {
    let verb = CString::new(cmd.verb.as_bytes()).ok()?;
    let argv = cmd
        .argv
        .iter()
        .map(|arg| CString::new(arg.as_bytes()).ok())
        .collect::<Option<Vec<_>>>()?;
    Some((verb, argv))
}

/// Leaves a forked child without running the parent's atexit handlers.
fn exit_child(status: i32) -> ! {
    let _ = io::stdout().flush();
    // SAFETY: `_exit` only terminates the calling process.
    unsafe { libc::_exit(status) }
}
