use anyhow::{Context, Result};
use argh::FromArgs;
use minishell::{CommandNode, Interpreter};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for trees that cannot be read or decoded.
const USAGE_ERROR: i32 = 2;

#[derive(FromArgs)]
/// Execute a command tree produced by an external parser.
///
/// The tree is read as JSON from --tree, from --file, or else from standard input.
/// The process exits with the status of the tree.
struct Args {
    /// the command tree, as JSON
    #[argh(option, short = 't')]
    tree: Option<String>,

    /// file holding the command tree
    #[argh(option, short = 'f')]
    file: Option<PathBuf>,

    /// log filter, e.g. "debug"; defaults to $MINISHELL_LOG, then "warn"
    #[argh(option)]
    log: Option<String>,
}

fn main() {
    let args: Args = argh::from_env();
    init_logging(args.log.as_deref());

    let json = match read_tree(&args) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("minishell: {:#}", e);
            std::process::exit(USAGE_ERROR);
        }
    };
    let tree = match CommandNode::from_json(&json) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("minishell: invalid command tree: {:#}", e);
            std::process::exit(USAGE_ERROR);
        }
    };

    let status = Interpreter.execute(&tree);
    std::process::exit(status)
}

fn read_tree(args: &Args) -> Result<String> {
    if let Some(tree) = &args.tree {
        return Ok(tree.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("can't read {}", path.display()));
    }
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}

fn init_logging(filter: Option<&str>) {
    let filter = filter
        .map(str::to_string)
        .or_else(|| std::env::var("MINISHELL_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .with(EnvFilter::new(filter))
        .init();
}
