use anyhow::{ Context, Result };
use std::fs;
use std::path::Path;

use mira::Artifact;

use crate::cli::ui;

/// Render a stored JSON artifact as markdown
pub fn execute(input_path: &Path, output_path: Option<&Path>) -> Result<()> {
    let json = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    let artifact = Artifact::from_json(&json)
        .with_context(|| format!("{} is not a valid artifact", input_path.display()))?;

    ui::print_artifact_summary(&artifact);
    ui::emit(&artifact.to_markdown(), output_path)
}
