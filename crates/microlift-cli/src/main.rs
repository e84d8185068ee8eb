#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "microlift")]
#[command(author, version, about = "Inspect the qiankun sub-app adapter transforms", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Emit JSON formatted logs to stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Transform an HTML entry point
    Html(commands::html::HtmlArgs),

    /// Transform an entry module or rewrite its asset paths
    Module(commands::module::ModuleArgs),

    /// Print the generated runtime snippets
    Shims(commands::shims::ShimsArgs),
}

/// Shared output options for the transform commands.
#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Write the transformed output here instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    outfile: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Html(args) => commands::html::run(&args, cli.json),
        Commands::Module(args) => commands::module::run(&args, cli.json),
        Commands::Shims(args) => commands::shims::run(&args, cli.json),
    };

    // In JSON mode failures still emit one valid object on stdout.
    if cli.json {
        if let Err(err) = result {
            println!(
                "{}",
                serde_json::json!({ "ok": false, "error": err.to_string() })
            );
            std::process::exit(1);
        }
        return Ok(());
    }

    result
}
