use crate::command::{ExecContext, ExitCode, FAILURE, status_of, succeeded};
use crate::process::{reap, spawn_subtree};
use crate::tree::CommandNode;
use tracing::warn;

/// Run `left` and `right` concurrently, each in its own child process.
///
/// Both children are waited for, in launch order, whichever finishes first.
/// The result is [`SUCCESS`](crate::command::SUCCESS) only if both exited with 0.
/// If the second fork fails the first child is still reaped before reporting
/// [`FAILURE`].
pub fn run_in_parallel(
    node: &CommandNode,
    left: &CommandNode,
    right: &CommandNode,
    ctx: ExecContext<'_>,
) -> ExitCode {
    let inner = ctx.child_of(node);

    let first = match spawn_subtree(left, inner, || Ok(())) {
        Ok(pid) => pid,
        Err(e) => {
            warn!("parallel: {:#}", e);
            return FAILURE;
        }
    };
    let second = match spawn_subtree(right, inner, || Ok(())) {
        Ok(pid) => pid,
        Err(e) => {
            warn!("parallel: {:#}", e);
            reap(first);
            return FAILURE;
        }
    };

    let first_status = reap(first);
    let second_status = reap(second);
    status_of(succeeded(first_status) && succeeded(second_status))
}
