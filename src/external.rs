use crate::command::{ExitCode, FAILURE};
use crate::process::{exit_child, fork_process, wait_for};
use crate::redirect::Redirections;
use crate::tree::SimpleCommand;
use anyhow::{Context, Result, bail};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::unistd::execvp;
use std::ffi::CString;
use tracing::debug;

/// Command that is not a builtin: a program looked up in `PATH`.
///
/// Everything the child needs is resolved before forking, so the child only
/// opens its redirections and replaces its image.
#[derive(Debug)]
pub struct ExternalCommand {
    name: String,
    argv: Vec<CString>,
    redirections: Redirections,
}

impl ExternalCommand {
    /// Resolve the argument vector and redirections of `cmd`.
    ///
    /// Fails when an argument contains a NUL byte, since it cannot be passed to
    /// the program.
    pub fn prepare(cmd: &SimpleCommand) -> Result<Self> {
        let words = cmd.argv();
        let name = words.first().cloned().unwrap_or_default();
        if name.is_empty() {
            bail!("empty command name");
        }
        let argv = words
            .into_iter()
            .map(|w| CString::new(w).with_context(|| format!("{}: argument contains a NUL byte", name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name,
            argv,
            redirections: Redirections::resolve(cmd),
        })
    }

    /// Run the program in a child process and wait for it.
    ///
    /// Returns the program's exit code when it exits normally and [`FAILURE`]
    /// otherwise. An `Err` means the child could not be created or waited for.
    pub fn execute(self) -> Result<ExitCode> {
        match fork_process()? {
            Some(pid) => {
                debug!(%pid, command = %self.name, "spawned");
                wait_for(pid)
            }
            None => self.exec_in_child(),
        }
    }

    fn exec_in_child(self) -> ! {
        let attached = self.redirections.open().and_then(|streams| streams.attach());
        if let Err(e) = attached {
            eprintln!("{}: {:#}", self.name, e);
            exit_child(FAILURE);
        }
        // The Rust runtime ignores SIGPIPE and an ignored disposition survives
        // exec; programs expect the default so that a closed pipe ends them.
        // SAFETY: SIG_DFL installs no handler code.
        if let Err(errno) = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
            debug!(%errno, command = %self.name, "cannot restore SIGPIPE");
        }
        match execvp(&self.argv[0], &self.argv) {
            Ok(never) => match never {},
            Err(errno) => {
                debug!(%errno, command = %self.name, "execvp failed");
                eprintln!("{}: execution failed", self.name);
                exit_child(FAILURE)
            }
        }
    }
}
