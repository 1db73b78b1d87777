use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Lines prepended to exported Markdown by the generator: the page title,
/// the Backlog back-link banner and a separator.
pub const GENERATED_HEADER_LINES: usize = 3;

/// Strip the generated header from exported Markdown. Files shorter than
/// four lines are kept whole; the result is trimmed either way.
pub fn page_content_from_text(text: &str) -> String {
    let lines = text.lines().collect::<Vec<_>>();
    if lines.len() > GENERATED_HEADER_LINES {
        lines[GENERATED_HEADER_LINES..].join("\n").trim().to_string()
    } else {
        text.trim().to_string()
    }
}

pub fn read_page_content(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read content file {}", path.display()))?;
    Ok(page_content_from_text(&text))
}
