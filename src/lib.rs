//! Execution engine of a tiny POSIX-like shell.
//!
//! Given a command tree produced by some parser, this crate runs it with real
//! operating-system processes: simple commands, the `cd`/`exit`/`quit` builtins,
//! `NAME=value` assignments, file redirections, and the operators `;`, `&`, `|`,
//! `&&` and `||`.
//!
//! The main entry point is [`Interpreter`]. Trees are built with the types of the
//! [`tree`] module, either in memory or decoded from JSON. Statuses follow the
//! shell convention described in [`command`].
//!
//! Concurrency only ever comes from forked child processes: `&` and `|` each fork
//! two children per activation. The crate never starts threads and expects to be
//! driven from a single-threaded process, such as the `minishell` binary.

mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
mod parallel;
mod pipe;
mod process;
pub mod redirect;
mod simple;
pub mod tree;

pub use builtin::{Builtin, CdTarget};
pub use command::{ExitCode, FAILURE, INVALID_TREE, SUCCESS};
/// Re-export of the tree executor.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use tree::{CommandNode, Operator, SimpleCommand, Word, WordPart};
