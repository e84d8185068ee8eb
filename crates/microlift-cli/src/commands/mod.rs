pub mod html;
pub mod module;
pub mod shims;

use std::path::{Path, PathBuf};
use std::time::Instant;

use miette::{IntoDiagnostic, Result};
use microlift_core::Error;
use serde_json::json;

use crate::OutputArgs;

/// Outcome of one transform invocation, reported identically by every
/// command.
pub struct Outcome {
    pub changed: bool,
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub started: Instant,
    pub outfile: Option<PathBuf>,
}

impl Outcome {
    pub fn new(input: &str) -> Self {
        Self {
            changed: false,
            bytes_in: input.len(),
            bytes_out: input.len(),
            started: Instant::now(),
            outfile: None,
        }
    }
}

/// Deliver transformed output and report the outcome.
///
/// With `--json`, a single stable object goes to stdout and the transformed
/// text only ever lands in the outfile. Otherwise the text goes to the
/// outfile or stdout.
pub fn finish(output: &str, mut outcome: Outcome, out: &OutputArgs, json: bool) -> Result<()> {
    outcome.bytes_out = output.len();

    if let Some(path) = &out.outfile {
        std::fs::write(path, output)
            .map_err(|source| Error::FileWrite {
                path: path.clone(),
                source,
            })
            .into_diagnostic()?;
        outcome.outfile = Some(path.clone());
        tracing::info!(outfile = %path.display(), "wrote transformed output");
    }

    if json {
        let report = json!({
            "ok": true,
            "changed": outcome.changed,
            "bytes_in": outcome.bytes_in,
            "bytes_out": outcome.bytes_out,
            "duration_ms": outcome.started.elapsed().as_millis() as u64,
            "outfile": outcome.outfile.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else if out.outfile.is_none() {
        println!("{output}");
    }

    Ok(())
}

pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })
        .into_diagnostic()
}
