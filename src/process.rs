//! Fork and wait primitives shared by the executors.
//!
//! Every child created here either replaces its image (external commands) or
//! evaluates a sub-tree and leaves through [`exit_child`]; it never returns into
//! the caller's evaluation.

use crate::command::{ExecContext, ExitCode, FAILURE};
use crate::interpreter::evaluate;
use crate::tree::CommandNode;
use anyhow::{Context, Result};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};
use std::io::Write;
use tracing::{debug, warn};

/// Flush the buffered standard streams so that a child does not inherit
/// (and later emit a second copy of) pending output.
pub(crate) fn flush_std_streams() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

/// Fork, returning `None` in the child and the child's pid in the parent.
pub(crate) fn fork_process() -> Result<Option<Pid>> {
    flush_std_streams();
    // SAFETY: the interpreter never starts threads, so the child is a complete
    // copy of a single-threaded process and may keep running arbitrary code.
    match unsafe { fork() }.context("fork failed")? {
        ForkResult::Parent { child } => Ok(Some(child)),
        ForkResult::Child => Ok(None),
    }
}

/// Fork a child that runs `setup`, evaluates `node` and exits with its status.
///
/// `setup` only runs in the child; it typically rewires standard streams. If it
/// fails the child reports the error and exits with [`FAILURE`] without
/// evaluating anything.
pub(crate) fn spawn_subtree<F>(node: &CommandNode, ctx: ExecContext<'_>, setup: F) -> Result<Pid>
where
    F: FnOnce() -> Result<()>,
{
    match fork_process()? {
        Some(pid) => {
            debug!(%pid, depth = ctx.depth, "forked sub-tree");
            Ok(pid)
        }
        None => {
            let status = match setup() {
                Ok(()) => evaluate(node, ctx),
                Err(e) => {
                    eprintln!("minishell: {:#}", e);
                    FAILURE
                }
            };
            exit_child(status)
        }
    }
}

/// Terminate a forked child with `status`.
pub(crate) fn exit_child(status: ExitCode) -> ! {
    flush_std_streams();
    std::process::exit(status)
}

/// Block until `pid` terminates and translate how it ended.
///
/// A normal exit yields the child's exit code; anything else (death by a
/// signal) yields [`FAILURE`].
pub(crate) fn wait_for(pid: Pid) -> Result<ExitCode> {
    let status = waitpid(pid, None).with_context(|| format!("waitpid({}) failed", pid))?;
    debug!(%pid, ?status, "child finished");
    Ok(match status {
        WaitStatus::Exited(_, code) => code,
        _ => FAILURE,
    })
}

/// [`wait_for`] with a failed wait reported as [`FAILURE`].
pub(crate) fn reap(pid: Pid) -> ExitCode {
    wait_for(pid).unwrap_or_else(|e| {
        warn!("{:#}", e);
        FAILURE
    })
}
