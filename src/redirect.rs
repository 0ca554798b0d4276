//! File redirections of a simple command.
//!
//! Targets are resolved to paths first ([`Redirections::resolve`]), opened
//! ([`Redirections::open`]) and finally attached to the standard stream slots
//! ([`OpenStreams::attach`]), which consumes the original descriptors.

use crate::tree::SimpleCommand;
use anyhow::{Context, Result};
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::dup2;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// Permission bits for files created by output redirection (before umask).
const CREATE_MODE: u32 = 0o644;

/// An output or error redirection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sink {
    pub path: PathBuf,
    pub append: bool,
}

/// Resolved redirection targets of one simple command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirections {
    pub input: Option<PathBuf>,
    pub output: Option<Sink>,
    pub error: Option<Sink>,
}

impl Redirections {
    /// Resolve the redirection words of `cmd` against the current environment.
    pub fn resolve(cmd: &SimpleCommand) -> Self {
        Self {
            input: cmd.input.as_ref().map(|w| PathBuf::from(w.resolve())),
            output: cmd.output.as_ref().map(|w| Sink {
                path: PathBuf::from(w.resolve()),
                append: cmd.append_output,
            }),
            error: cmd.error.as_ref().map(|w| Sink {
                path: PathBuf::from(w.resolve()),
                append: cmd.append_error,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none() && self.error.is_none()
    }

    /// Output and error go to the same file.
    fn shared_sink(&self) -> bool {
        matches!((&self.output, &self.error), (Some(out), Some(err)) if out.path == err.path)
    }

    /// Open every target.
    ///
    /// The input must exist. Outputs are created when missing and truncated
    /// unless their append flag is set. When output and error name the same
    /// path the file is opened only once, with the output's append flag, so
    /// that it is never truncated twice.
    pub fn open(&self) -> Result<OpenStreams> {
        let stdin = match &self.input {
            Some(path) => Some(OwnedFd::from(File::open(path).with_context(|| {
                format!("{}: cannot open for reading", path.display())
            })?)),
            None => None,
        };
        let stdout = match &self.output {
            Some(sink) => Some(open_sink(sink)?),
            None => None,
        };
        let shared_err = self.shared_sink();
        let stderr = match &self.error {
            Some(sink) if !shared_err => Some(open_sink(sink)?),
            _ => None,
        };
        Ok(OpenStreams {
            stdin,
            stdout,
            stderr,
            shared_err,
        })
    }
}

fn open_sink(sink: &Sink) -> Result<OwnedFd> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(sink.append)
        .truncate(!sink.append)
        .mode(CREATE_MODE)
        .open(&sink.path)
        .with_context(|| format!("{}: cannot open for writing", sink.path.display()))?;
    Ok(OwnedFd::from(file))
}

/// Descriptors opened for redirection, owned until attached or dropped.
#[derive(Debug)]
pub struct OpenStreams {
    stdin: Option<OwnedFd>,
    stdout: Option<OwnedFd>,
    stderr: Option<OwnedFd>,
    /// stderr is served by the stdout descriptor.
    shared_err: bool,
}

impl OpenStreams {
    /// Attach the descriptors to the standard streams of the current process,
    /// closing the originals.
    pub fn attach(self) -> Result<()> {
        if let Some(fd) = self.stdin {
            install(fd, &[STDIN_FILENO])?;
        }
        if let Some(fd) = self.stdout {
            if self.shared_err {
                install(fd, &[STDOUT_FILENO, STDERR_FILENO])?;
            } else {
                install(fd, &[STDOUT_FILENO])?;
            }
        }
        if let Some(fd) = self.stderr {
            install(fd, &[STDERR_FILENO])?;
        }
        Ok(())
    }
}

/// Duplicate `fd` onto every slot, then close it unless it already is one of them.
fn install(fd: OwnedFd, slots: &[RawFd]) -> Result<()> {
    let raw = fd.as_raw_fd();
    for &slot in slots {
        if raw != slot {
            dup2(raw, slot).with_context(|| format!("dup2({}, {}) failed", raw, slot))?;
        }
    }
    if slots.contains(&raw) {
        // The descriptor now lives in a standard slot.
        let _ = fd.into_raw_fd();
    }
    Ok(())
}
