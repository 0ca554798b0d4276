use crate::builtin::Builtin;
use crate::command::{ExecContext, ExitCode, FAILURE, INVALID_TREE, SUCCESS};
use crate::env::set_var;
use crate::external::ExternalCommand;
use crate::redirect::Redirections;
use crate::tree::{SimpleCommand, Word};
use tracing::{debug, error, warn};

/// Execute one leaf of the tree.
///
/// In order: builtins (`cd`, `exit`, `quit`) run in the calling process,
/// `NAME=value` assignments update the process environment, and anything else
/// is run as an external program in a child process.
pub fn execute_simple(cmd: &SimpleCommand, ctx: ExecContext<'_>) -> ExitCode {
    if cmd.verb.is_empty() {
        error!(depth = ctx.depth, "simple command without a verb");
        return INVALID_TREE;
    }

    let verb = cmd.verb.resolve();
    if let Some(builtin) = Builtin::lookup(&verb) {
        return run_builtin(builtin, cmd);
    }

    if let Some((name, value)) = cmd.verb.as_assignment() {
        return assign(name, &value);
    }

    match ExternalCommand::prepare(cmd).and_then(ExternalCommand::execute) {
        Ok(status) => status,
        Err(e) => {
            warn!("{}: {:#}", verb, e);
            FAILURE
        }
    }
}

fn run_builtin(builtin: Builtin, cmd: &SimpleCommand) -> ExitCode {
    if builtin == Builtin::Cd {
        // cd never writes through its redirections, but the target files are
        // still created or truncated as requested.
        let redirections = Redirections::resolve(cmd);
        if let Err(e) = redirections.open() {
            warn!("cd: {:#}", e);
            return FAILURE;
        }
    }
    builtin.execute(&cmd.params)
}

fn assign(name: &str, value: &Word) -> ExitCode {
    let value = value.resolve();
    match set_var(name, &value) {
        Ok(()) => {
            debug!(name, value = %value, "assigned");
            SUCCESS
        }
        Err(e) => {
            warn!("{:#}", e);
            FAILURE
        }
    }
}
