use std::path::PathBuf;

use miette::Result;
use microlift_core::{html, CapturedConfig, MicroAppOptions};

use super::{finish, read_input, Outcome};
use crate::OutputArgs;

#[derive(clap::Args, Debug)]
pub struct HtmlArgs {
    /// HTML entry point to transform
    pub file: PathBuf,

    /// Sub-application name
    #[arg(short, long)]
    pub name: String,

    /// Enable dev-mode import prefixing
    #[arg(long)]
    pub dev: bool,

    /// Treat the build as production
    #[arg(long)]
    pub production: bool,

    /// Base public path
    #[arg(long, default_value = "/")]
    pub base: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run(args: &HtmlArgs, json: bool) -> Result<()> {
    let input = read_input(&args.file)?;
    let mut outcome = Outcome::new(&input);

    let options = MicroAppOptions::new().dev_mode(args.dev);
    let config = CapturedConfig {
        is_production: args.production,
        base: args.base.clone(),
        ..CapturedConfig::default()
    };

    let transformed = html::transform_index_html(&input, &args.name, &options, &config)
        .map_err(|e| miette::miette!("{e}"))?;

    let output = match transformed {
        Some(out) => {
            outcome.changed = true;
            tracing::debug!(file = %args.file.display(), "rewrote entry scripts");
            out
        }
        None => {
            tracing::debug!(file = %args.file.display(), "no matching script tags, passing through");
            input
        }
    };

    finish(&output, outcome, &args.output, json)
}
