//! Test doubles for the executor.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use nix::unistd::{pipe, Pid};

use super::error::ExecError;
use super::executor::Executor;
use super::launcher::{external_leaf, Channel, ChildExit, ChildHandle, Launcher, Wiring};
use crate::shell::parser::ast::{CommandNode, Operator, SimpleCommand};

pub fn leaf(words: &[&str]) -> CommandNode {
    CommandNode::Leaf(SimpleCommand::new(words.iter().copied()))
}

/// Records every process operation instead of performing it.
///
/// `launch` resolves immediately with the exit configured for the verb
/// (default `Exited(0)`). `fork_subtree` mirrors [`ForkLauncher`]: an
/// external leaf is recorded as `exec` and the branch takes that verb's exit;
/// any other subtree is evaluated on the spot and the branch exits normally
/// with its status. Pids are handed out in call order starting at 1.
///
/// [`ForkLauncher`]: super::launcher::ForkLauncher
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    log: Rc<RefCell<Vec<String>>>,
    exits: Rc<RefCell<HashMap<String, ChildExit>>>,
    pending: Rc<RefCell<HashMap<i32, ChildExit>>>,
    next_pid: Rc<Cell<i32>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit(self, verb: &str, exit: ChildExit) -> Self {
        self.exits.borrow_mut().insert(verb.to_string(), exit);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn record(&self, call: String) {
        self.log.borrow_mut().push(call);
    }

    fn exit_for(&self, verb: &str) -> ChildExit {
        self.exits
            .borrow()
            .get(verb)
            .copied()
            .unwrap_or(ChildExit::Exited(0))
    }

    fn register(&self, exit: ChildExit) -> ChildHandle {
        let pid = self.next_pid.get() + 1;
        self.next_pid.set(pid);
        self.pending.borrow_mut().insert(pid, exit);
        ChildHandle::new(Pid::from_raw(pid))
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&mut self, cmd: &SimpleCommand) -> Result<ChildHandle, ExecError> {
        self.record(format!("launch {}", cmd.argv.join(" ")));
        Ok(self.register(self.exit_for(&cmd.verb)))
    }

    fn fork_subtree(
        &mut self,
        node: &CommandNode,
        depth: usize,
        parent: Operator,
        _wiring: Wiring,
    ) -> Result<ChildHandle, ExecError> {
        self.record(format!("fork {}", parent));
        if let Some(cmd) = external_leaf(node) {
            self.record(format!("exec {}", cmd.argv.join(" ")));
            return Ok(self.register(self.exit_for(&cmd.verb)));
        }
        let status = Executor::new(self.clone()).execute(node, depth, Some(parent))?;
        let exit = ChildExit::Exited(status);
        Ok(self.register(exit))
    }

    fn channel(&mut self) -> Result<Channel, ExecError> {
        self.record("channel".to_string());
        let (read, write) = pipe().map_err(ExecError::Channel)?;
        Ok(Channel { read, write })
    }

    fn wait(&mut self, child: ChildHandle) -> Result<ChildExit, ExecError> {
        let pid = child.pid.as_raw();
        self.record(format!("wait {}", pid));
        Ok(self
            .pending
            .borrow_mut()
            .remove(&pid)
            .unwrap_or(ChildExit::Exited(0)))
    }
}
