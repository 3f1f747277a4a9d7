use log::debug;

use super::builtin::Builtin;
use super::error::ExecStatus;
use super::launcher::{run_simple, ForkLauncher, Launcher};
use super::parallel::run_parallel;
use super::pipeline::run_pipe;
use crate::shell::parser::ast::{CommandNode, Operator, SimpleCommand};

/// Walks a command tree and returns its exit status.
///
/// Builtins and the control flow of `;`, `&&` and `||` run in the calling
/// process. Everything else goes through the [`Launcher`].
pub struct Executor<L: Launcher = ForkLauncher> {
    launcher: L,
}

impl Executor<ForkLauncher> {
    pub fn forking() -> Self {
        Self::new(ForkLauncher)
    }
}

impl<L: Launcher> Executor<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    /// Evaluates `node`. `depth` and `parent` only feed the log.
    ///
    /// An `Err` means a process primitive failed and the session should end;
    /// failing commands are reported through the returned status.
    pub fn execute(
        &mut self,
        node: &CommandNode,
        depth: usize,
        parent: Option<Operator>,
    ) -> ExecStatus {
        debug!(
            "execute depth={} {} (parent: {})",
            depth,
            node.label(),
            parent.map_or_else(|| "-".to_string(), |op| op.to_string())
        );

        match node {
            CommandNode::Leaf(command) => self.execute_leaf(command),
            CommandNode::Internal { op, left, right } => {
                let op = *op;
                let depth = depth + 1;
                match op {
                    Operator::Sequential => {
                        self.execute(left, depth, Some(op))?;
                        self.execute(right, depth, Some(op))
                    }
                    Operator::AndThen => {
                        let status = self.execute(left, depth, Some(op))?;
                        if status == 0 {
                            self.execute(right, depth, Some(op))
                        } else {
                            Ok(status)
                        }
                    }
                    Operator::OrElse => {
                        let status = self.execute(left, depth, Some(op))?;
                        if status != 0 {
                            self.execute(right, depth, Some(op))
                        } else {
                            Ok(0)
                        }
                    }
                    Operator::Parallel => run_parallel(&mut self.launcher, left, right, depth),
                    Operator::Pipe => run_pipe(&mut self.launcher, left, right, depth),
                }
            }
        }
    }

    fn execute_leaf(&mut self, command: &SimpleCommand) -> ExecStatus {
        if command.verb.is_empty() {
            return Ok(0);
        }

        if let Some(builtin) = Builtin::lookup(command) {
            debug!("builtin {:?}: {:?}", builtin, command.argv);
            return Ok(builtin.run(command));
        }

        run_simple(&mut self.launcher, command)
    }
}
