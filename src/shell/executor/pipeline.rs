use log::debug;

use super::error::{ExecStatus, EXIT_FAILURE};
use super::launcher::{ChildExit, Launcher, Wiring};
use crate::shell::parser::ast::{CommandNode, Operator};

/// `left | right`: both sides run in their own process, joined by one pipe.
pub fn run_pipe<L: Launcher>(
    launcher: &mut L,
    left: &CommandNode,
    right: &CommandNode,
    depth: usize,
) -> ExecStatus {
    let channel = launcher.channel()?;

    let writer = launcher.fork_subtree(left, depth, Operator::Pipe, Wiring::pipe_writer(&channel))?;
    let reader =
        match launcher.fork_subtree(right, depth, Operator::Pipe, Wiring::pipe_reader(&channel)) {
            Ok(reader) => reader,
            Err(e) => {
                drop(channel);
                let _ = launcher.wait(writer);
                return Err(e);
            }
        };

    // The parent never touches the pipe; the reader only sees EOF once every
    // write end is closed.
    drop(channel);

    let left_exit = launcher.wait(writer);
    let right_exit = launcher.wait(reader);
    let (left_exit, right_exit) = (left_exit?, right_exit?);
    debug!("pipe finished: {:?} | {:?}", left_exit, right_exit);
    Ok(pipe_status(left_exit, right_exit))
}

/// Last stage decides, unless a stage was killed.
fn pipe_status(left: ChildExit, right: ChildExit) -> i32 {
    if left.is_abnormal() || right.is_abnormal() {
        EXIT_FAILURE
    } else {
        right.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::executor::testing::{leaf, RecordingLauncher};

    #[test]
    fn test_pipe_status_policy() {
        assert_eq!(pipe_status(ChildExit::Exited(0), ChildExit::Exited(0)), 0);
        assert_eq!(pipe_status(ChildExit::Exited(3), ChildExit::Exited(0)), 0);
        assert_eq!(pipe_status(ChildExit::Exited(0), ChildExit::Exited(4)), 4);
        assert_eq!(pipe_status(ChildExit::Signaled(13), ChildExit::Exited(0)), EXIT_FAILURE);
        assert_eq!(pipe_status(ChildExit::Exited(0), ChildExit::Signaled(9)), EXIT_FAILURE);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_both_stages_forked_in_order_then_waited() {
        let mut launcher = RecordingLauncher::new();
        let status = run_pipe(&mut launcher, &leaf(&["ls"]), &leaf(&["wc", "-l"]), 1).unwrap();

        assert_eq!(status, 0);
        assert_eq!(
            launcher.calls(),
            vec![
                "channel",
                "fork |",
                "exec ls",
                "fork |",
                "exec wc -l",
                "wait 1",
                "wait 2",
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_first_stage_failure_is_swallowed() {
        let mut launcher = RecordingLauncher::new().with_exit("grep", ChildExit::Exited(1));
        let status = run_pipe(&mut launcher, &leaf(&["grep", "x"]), &leaf(&["cat"]), 1).unwrap();
        assert_eq!(status, 0);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_last_stage_status_is_returned() {
        let mut launcher = RecordingLauncher::new().with_exit("grep", ChildExit::Exited(1));
        let status = run_pipe(&mut launcher, &leaf(&["cat"]), &leaf(&["grep", "x"]), 1).unwrap();
        assert_eq!(status, 1);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_killed_stage_fails_the_pipe() {
        let mut launcher = RecordingLauncher::new().with_exit("yes", ChildExit::Signaled(13));
        let status = run_pipe(&mut launcher, &leaf(&["yes"]), &leaf(&["true"]), 1).unwrap();
        assert_eq!(status, EXIT_FAILURE);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_killed_leaf_inside_compound_stage_is_a_plain_failure() {
        // (yes && true) | cat: the stage itself exits normally with 1
        let mut launcher = RecordingLauncher::new().with_exit("yes", ChildExit::Signaled(13));
        let left = CommandNode::internal(Operator::AndThen, leaf(&["yes"]), leaf(&["true"]));
        let status = run_pipe(&mut launcher, &left, &leaf(&["cat"]), 1).unwrap();
        assert_eq!(status, 0);
    }
}
