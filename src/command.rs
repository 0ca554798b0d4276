use crate::tree::{CommandNode, Operator};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Status of a command that completed successfully.
pub const SUCCESS: ExitCode = 0;

/// Generic failure status.
///
/// Reported for failed builtins, fork/pipe/wait failures, children that did not
/// exit normally (e.g. killed by a signal) and programs that could not be executed.
pub const FAILURE: ExitCode = 1;

/// Status reported for a tree the evaluator cannot run: an unrecognized operator
/// or a leaf with an empty verb.
///
/// Negative so that it can never be confused with the exit code of a process.
/// It only keeps that property inside one process: a forked `&` or `|` child
/// that ends with it exits with 255, which its parent sees as an ordinary
/// failure code.
pub const INVALID_TREE: ExitCode = -1;

/// Map a success flag onto the status convention.
pub fn status_of(success: bool) -> ExitCode {
    if success { SUCCESS } else { FAILURE }
}

/// Whether `status` denotes success.
pub fn succeeded(status: ExitCode) -> bool {
    status == SUCCESS
}

/// Diagnostic context threaded through the recursive evaluation.
///
/// It never influences control flow: it only feeds the `tracing` fields emitted
/// while the tree is walked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecContext<'a> {
    /// Nesting level of the node currently evaluated; the root is at depth 0.
    pub depth: usize,
    /// Node that dispatched the current one, if any.
    pub parent: Option<&'a CommandNode>,
}

impl<'a> ExecContext<'a> {
    /// Context for the root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Context for a child of `node`, one level deeper.
    pub fn child_of(&self, node: &'a CommandNode) -> Self {
        Self {
            depth: self.depth + 1,
            parent: Some(node),
        }
    }

    /// Operator of the parent node, for log fields.
    pub fn parent_op(&self) -> Option<&'a Operator> {
        self.parent.and_then(CommandNode::operator)
    }
}
