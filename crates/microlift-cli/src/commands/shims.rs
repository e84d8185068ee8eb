use miette::{IntoDiagnostic, Result};
use microlift_core::shims;
use serde_json::json;

#[derive(clap::Args, Debug)]
pub struct ShimsArgs {
    /// Sub-application name
    #[arg(short, long)]
    pub name: String,

    /// Print only one snippet
    #[arg(long, value_enum)]
    pub part: Option<ShimPart>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ShimPart {
    /// The handshake-creation script injected into <body>
    Handshake,
    /// The .finally continuation chained onto the last entry import
    Finally,
    /// The runtime helper module
    Helper,
}

pub fn run(args: &ShimsArgs, json: bool) -> Result<()> {
    let handshake = shims::handshake_script(&args.name);
    let finally = shims::import_finally_resolve(&args.name);
    let helper = shims::helper_module_source();

    if json {
        let report = match args.part {
            Some(ShimPart::Handshake) => json!({ "ok": true, "handshake": handshake }),
            Some(ShimPart::Finally) => json!({ "ok": true, "finally": finally }),
            Some(ShimPart::Helper) => json!({ "ok": true, "helper": helper }),
            None => json!({
                "ok": true,
                "handshake": handshake,
                "finally": finally,
                "helper": helper,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    match args.part {
        Some(ShimPart::Handshake) => println!("{handshake}"),
        Some(ShimPart::Finally) => println!("{finally}"),
        Some(ShimPart::Helper) => println!("{helper}"),
        None => {
            println!("// handshake (inline <body> script)\n{handshake}");
            println!("// finally continuation (last entry import)\n{finally}");
            println!("// helper module ({})\n{helper}", shims::HELPER_SPECIFIER);
        }
    }

    Ok(())
}
