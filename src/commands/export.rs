//! Export command implementation.

use super::models::ExportArgs;
use crate::output::{read_bundles, write_export, ExportOptions};
use anyhow::{Context, Result};
use log::info;

/// Execute the export command
///
/// Reads every input file (each may hold one or many bundles) and writes
/// them as a single export.
pub fn execute_export(args: ExportArgs) -> Result<usize> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one input file is required");
    }

    let mut bundles = Vec::new();
    for input in &args.inputs {
        let mut loaded = read_bundles(input)
            .with_context(|| format!("Failed to read trace data {}", input.display()))?;
        bundles.append(&mut loaded);
    }

    let options = ExportOptions {
        strip_io: args.strip_io,
    };
    write_export(&bundles, args.format, options, &args.output)
        .context("Failed to write export")?;

    info!(
        "✓ Exported {} trace(s) to: {}",
        bundles.len(),
        args.output.display()
    );

    Ok(bundles.len())
}
