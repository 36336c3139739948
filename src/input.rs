//! Gathering comments to analyse from the command line, a file or stdin.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

pub const EMPTY_BATCH_MESSAGE: &str = "Please enter some text to analyze, one comment per line.";

/// Raw input text. Positional args win over `--file`, which wins over stdin.
pub fn collect_input<R: Read>(args: &[String], file: Option<&Path>, mut stdin: R) -> Result<String> {
    if !args.is_empty() {
        return Ok(args.join("\n"));
    }

    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read comments from {}", path.display()));
    }

    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("Failed to read comments from stdin")?;
    Ok(buffer)
}

/// One comment per line, trimmed, blank lines dropped.
pub fn split_batch(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
