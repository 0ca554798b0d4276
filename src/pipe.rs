use crate::command::{ExecContext, ExitCode, FAILURE};
use crate::process::{reap, spawn_subtree};
use crate::tree::CommandNode;
use anyhow::Context;
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{close, dup2, pipe};
use std::os::fd::{AsRawFd, RawFd};
use tracing::warn;

/// Run `left | right`: two children joined by an anonymous pipe.
///
/// The reported status is the one of `right` alone; a failing producer is not
/// visible to the caller.
///
/// Every process closes the pipe ends it does not use. The reader only sees
/// end-of-stream once all copies of the write end are closed, so a copy left
/// open anywhere would block `right` forever.
pub fn run_on_pipe(
    node: &CommandNode,
    left: &CommandNode,
    right: &CommandNode,
    ctx: ExecContext<'_>,
) -> ExitCode {
    let inner = ctx.child_of(node);

    let (read_end, write_end) = match pipe().context("pipe failed") {
        Ok(ends) => ends,
        Err(e) => {
            warn!("{:#}", e);
            return FAILURE;
        }
    };
    let (read_fd, write_fd) = (read_end.as_raw_fd(), write_end.as_raw_fd());

    let producer = spawn_subtree(left, inner, || {
        close(read_fd).context("closing pipe read end")?;
        move_fd(write_fd, STDOUT_FILENO)
    });
    // The parent never writes into the pipe.
    drop(write_end);
    let producer = match producer {
        Ok(pid) => pid,
        Err(e) => {
            warn!("pipe: {:#}", e);
            return FAILURE;
        }
    };

    let consumer = spawn_subtree(right, inner, || move_fd(read_fd, STDIN_FILENO));
    drop(read_end);
    let consumer = match consumer {
        Ok(pid) => pid,
        Err(e) => {
            warn!("pipe: {:#}", e);
            reap(producer);
            return FAILURE;
        }
    };

    reap(producer);
    reap(consumer)
}

/// Duplicate `fd` onto `slot` and close the original.
fn move_fd(fd: RawFd, slot: RawFd) -> anyhow::Result<()> {
    if fd != slot {
        dup2(fd, slot).with_context(|| format!("dup2({}, {}) failed", fd, slot))?;
        close(fd).with_context(|| format!("close({}) failed", fd))?;
    }
    Ok(())
}
