use log::debug;

use super::error::ExecStatus;
use super::launcher::{ChildExit, Launcher, Wiring};
use crate::shell::parser::ast::{CommandNode, Operator};

/// `left & right`: both subtrees run concurrently in their own processes with
/// the shell's standard streams. Both are always waited for.
pub fn run_parallel<L: Launcher>(
    launcher: &mut L,
    left: &CommandNode,
    right: &CommandNode,
    depth: usize,
) -> ExecStatus {
    let first = launcher.fork_subtree(left, depth, Operator::Parallel, Wiring::inherit())?;
    let second =
        match launcher.fork_subtree(right, depth, Operator::Parallel, Wiring::inherit()) {
            Ok(second) => second,
            Err(e) => {
                let _ = launcher.wait(first);
                return Err(e);
            }
        };

    let first_exit = launcher.wait(first);
    let second_exit = launcher.wait(second);
    let (first_exit, second_exit) = (first_exit?, second_exit?);
    debug!("parallel finished: {:?} & {:?}", first_exit, second_exit);
    Ok(parallel_status(first_exit, second_exit))
}

/// Zero only when both branches exited with zero; otherwise the first
/// failing branch's status.
fn parallel_status(first: ChildExit, second: ChildExit) -> i32 {
    [first, second]
        .iter()
        .find(|exit| !exit.success())
        .map_or(0, ChildExit::status)
}
