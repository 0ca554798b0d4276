use crate::command::{ExecContext, ExitCode, INVALID_TREE, succeeded};
use crate::parallel::run_in_parallel;
use crate::pipe::run_on_pipe;
use crate::simple::execute_simple;
use crate::tree::{CommandNode, Operator};
use anyhow::Result;
use tracing::{debug, error};

/// Executes command trees produced by an external parser.
///
/// The interpreter keeps no state of its own: working directory and environment
/// belong to the process, and builtins and assignments change them in place.
///
/// Example
/// ```no_run
/// use minishell::{CommandNode, Interpreter, SimpleCommand};
/// let tree = CommandNode::and(
///     SimpleCommand::new("true").into(),
///     SimpleCommand::new("echo").arg("hello").into(),
/// );
/// let code = Interpreter::default().execute(&tree);
/// assert_eq!(code, 0);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Interpreter;

impl Interpreter {
    /// Run a whole tree and return its status.
    pub fn execute(&self, tree: &CommandNode) -> ExitCode {
        evaluate(tree, ExecContext::root())
    }

    /// Decode a tree from JSON and run it.
    pub fn execute_json(&self, json: &str) -> Result<ExitCode> {
        let tree = CommandNode::from_json(json)?;
        Ok(self.execute(&tree))
    }
}

/// Recursive dispatch on a node.
///
/// `ctx` is only used for diagnostics.
pub(crate) fn evaluate(node: &CommandNode, ctx: ExecContext<'_>) -> ExitCode {
    let (op, left, right) = match node {
        CommandNode::Simple(cmd) => {
            debug!(
                depth = ctx.depth,
                parent = ctx.parent_op().map(Operator::as_str),
                verb = %cmd.verb,
                "simple command"
            );
            return execute_simple(cmd, ctx);
        }
        CommandNode::Compound { op, left, right } => (op, left.as_ref(), right.as_ref()),
    };

    debug!(
        depth = ctx.depth,
        parent = ctx.parent_op().map(Operator::as_str),
        op = %op,
        "compound command"
    );
    let inner = ctx.child_of(node);

    match op {
        Operator::Sequential => {
            let first = evaluate(left, inner);
            let second = evaluate(right, inner);
            combine_sequential(first, second)
        }
        Operator::Or => {
            let first = evaluate(left, inner);
            if succeeded(first) {
                first
            } else {
                evaluate(right, inner)
            }
        }
        Operator::And => {
            let first = evaluate(left, inner);
            if succeeded(first) {
                evaluate(right, inner)
            } else {
                first
            }
        }
        Operator::Parallel => run_in_parallel(node, left, right, ctx),
        Operator::Pipe => run_on_pipe(node, left, right, ctx),
        Operator::Unknown(tag) => {
            error!(depth = ctx.depth, op = %tag, "unrecognized operator");
            INVALID_TREE
        }
    }
}

/// `a ; b` succeeds only if both sides did; the code of the last failure is kept.
fn combine_sequential(first: ExitCode, second: ExitCode) -> ExitCode {
    if succeeded(second) { first } else { second }
}
