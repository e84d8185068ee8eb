use std::path::PathBuf;

use miette::Result;
use microlift_core::{module, CapturedConfig, MatchPattern, MicroAppOptions};

use super::{finish, read_input, Outcome};
use crate::OutputArgs;

#[derive(clap::Args, Debug)]
pub struct ModuleArgs {
    /// Module source file to transform
    pub file: PathBuf,

    /// Sub-application name
    #[arg(short, long)]
    pub name: String,

    /// Entry pattern matched against the module id (the file path)
    #[arg(long, value_name = "PATTERN")]
    pub entry: Option<String>,

    /// Interpret the entry pattern as a regex instead of a substring
    #[arg(long)]
    pub regex: bool,

    /// Module-level variable to hoist onto the sandbox window (repeatable)
    #[arg(long = "sandbox-var", value_name = "NAME")]
    pub sandbox_vars: Vec<String>,

    /// Code appended verbatim after the lifecycle registration
    #[arg(long, value_name = "CODE")]
    pub append: Option<String>,

    /// Rewrite /src/ asset references instead of the entry rewrite
    #[arg(long)]
    pub rewrite_assets: bool,

    /// Dev server host for asset URLs
    #[arg(long)]
    pub host: Option<String>,

    /// Dev server port for asset URLs
    #[arg(long)]
    pub port: Option<u16>,

    /// Treat the build as production
    #[arg(long)]
    pub production: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run(args: &ModuleArgs, json: bool) -> Result<()> {
    let input = read_input(&args.file)?;
    let mut outcome = Outcome::new(&input);

    let mut options = MicroAppOptions::new().rewrite_assets_path(args.rewrite_assets);
    if let Some(pattern) = &args.entry {
        let matcher = if args.regex {
            MatchPattern::regex(pattern).map_err(|e| miette::miette!("{e}"))?
        } else {
            MatchPattern::substring(pattern)
        };
        options = options.entry_matcher(matcher);
    }
    for var in &args.sandbox_vars {
        options = options.sandbox_variable(var);
    }
    if let Some(code) = &args.append {
        options = options.appended_code(code);
    }

    let defaults = CapturedConfig::default();
    let config = CapturedConfig {
        is_production: args.production,
        server_host: args.host.clone().unwrap_or(defaults.server_host.clone()),
        server_port: args.port.unwrap_or(defaults.server_port),
        ..defaults
    };

    let id = args.file.display().to_string();
    let transformed = module::transform(&input, &id, &args.name, &options, &config)
        .map_err(|e| miette::miette!("{e}"))?;

    let output = match transformed {
        Some(out) => {
            outcome.changed = true;
            tracing::debug!(id = %id, "module transformed");
            out
        }
        None => {
            tracing::debug!(id = %id, "module not matched, passing through");
            input
        }
    };

    finish(&output, outcome, &args.output, json)
}
