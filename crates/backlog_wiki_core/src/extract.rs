use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Records extracted from a batch land here, one JSON object per line.
/// The file is rewritten from scratch on every run.
pub const WIKI_UPDATES_FILE: &str = "wiki_updates.json";

lazy_static! {
    static ref WIKI_LINK_RE: Regex = Regex::new(r"\[Backlog Wiki Link\]\(([^)]+)\)").unwrap();
    static ref WIKI_ID_RE: Regex = Regex::new(r"/wiki/(\d+)").unwrap();
    static ref HEADING_RE: Regex = Regex::new(r"(?m)^# (.+)$").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WikiInfo {
    pub wiki_id: String,
    pub wiki_name: String,
    pub file_path: String,
    pub wiki_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingFile,
    UnreadableFile(String),
    LinkNotFound,
    WikiIdNotFound { url: String },
}

impl SkipReason {
    pub fn describe(&self, file_path: &str) -> String {
        match self {
            Self::MissingFile => format!("file not found: {file_path}"),
            Self::UnreadableFile(detail) => format!("error reading {file_path}: {detail}"),
            Self::LinkNotFound => format!("no Backlog Wiki Link found in: {file_path}"),
            Self::WikiIdNotFound { url } => format!("could not extract a wiki id from URL: {url}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExtractOutcome {
    Extracted(WikiInfo),
    Skipped { file_path: String, reason: SkipReason },
}

#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub outcomes: Vec<ExtractOutcome>,
}

impl ExtractReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn records(&self) -> Vec<&WikiInfo> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ExtractOutcome::Extracted(info) => Some(info),
                ExtractOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ExtractOutcome::Extracted(_) => None,
                ExtractOutcome::Skipped { file_path, reason } => {
                    Some((file_path.as_str(), reason))
                }
            })
            .collect()
    }
}

/// Pull the wiki id, name and link out of one exported Markdown file.
/// The name comes from the first `# ` heading, else from the file stem.
pub fn extract_wiki_info(path: &Path) -> Result<WikiInfo, SkipReason> {
    if !path.exists() {
        return Err(SkipReason::MissingFile);
    }
    let text =
        fs::read_to_string(path).map_err(|error| SkipReason::UnreadableFile(error.to_string()))?;

    let wiki_url = match WIKI_LINK_RE
        .captures(&text)
        .and_then(|captures| captures.get(1))
    {
        Some(group) => group.as_str().to_string(),
        None => return Err(SkipReason::LinkNotFound),
    };

    let wiki_id = match WIKI_ID_RE
        .captures(&wiki_url)
        .and_then(|captures| captures.get(1))
    {
        Some(group) => group.as_str().to_string(),
        None => return Err(SkipReason::WikiIdNotFound { url: wiki_url }),
    };

    let wiki_name = HEADING_RE
        .captures(&text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().trim().to_string())
        .unwrap_or_else(|| file_stem(path));

    Ok(WikiInfo {
        wiki_id,
        wiki_name,
        file_path: path.display().to_string(),
        wiki_url,
    })
}

/// Process every path independently; one bad file never stops the batch.
pub fn extract_batch(paths: &[PathBuf]) -> ExtractReport {
    let mut report = ExtractReport::default();
    for path in paths {
        match extract_wiki_info(path) {
            Ok(info) => report.outcomes.push(ExtractOutcome::Extracted(info)),
            Err(reason) => report.outcomes.push(ExtractOutcome::Skipped {
                file_path: path.display().to_string(),
                reason,
            }),
        }
    }
    report
}

/// Rewrite the output file with one JSON line per extracted record.
/// Returns how many records were written.
pub fn write_updates_file(report: &ExtractReport, output: &Path) -> Result<usize> {
    let records = report.records();
    let mut body = String::new();
    for info in &records {
        let line = serde_json::to_string(info).context("failed to serialize wiki record")?;
        body.push_str(&line);
        body.push('\n');
    }
    fs::write(output, body).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(records.len())
}

pub fn extract_all(paths: &[PathBuf], output: &Path) -> Result<ExtractReport> {
    let report = extract_batch(paths);
    write_updates_file(&report, output)?;
    Ok(report)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::tempdir;

    use super::{
        ExtractOutcome, SkipReason, WikiInfo, extract_all, extract_batch, extract_wiki_info,
    };

    const BANNER: &str = "[Backlog Wiki Link](https://example.backlog.jp/alias/wiki/987)";

    fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("write fixture");
        path
    }

    #[test]
    fn extracts_id_name_and_url() {
        let temp = tempdir().expect("tempdir");
        let path = write_file(temp.path(), "page.md", &format!("# My Page\n{BANNER}\n---\nBody.\n"));
        let info = extract_wiki_info(&path).expect("extract");
        assert_eq!(info.wiki_id, "987");
        assert_eq!(info.wiki_name, "My Page");
        assert_eq!(info.wiki_url, "https://example.backlog.jp/alias/wiki/987");
        assert_eq!(info.file_path, path.display().to_string());
    }

    #[test]
    fn name_falls_back_to_the_file_stem() {
        let temp = tempdir().expect("tempdir");
        let path = write_file(temp.path(), "release-notes.md", BANNER);
        let info = extract_wiki_info(&path).expect("extract");
        assert_eq!(info.wiki_name, "release-notes");
    }

    #[test]
    fn the_first_heading_wins_and_is_trimmed() {
        let temp = tempdir().expect("tempdir");
        let path = write_file(
            temp.path(),
            "page.md",
            &format!("{BANNER}\n# First Title  \n# Second Title\n"),
        );
        let info = extract_wiki_info(&path).expect("extract");
        assert_eq!(info.wiki_name, "First Title");
    }

    #[test]
    fn missing_files_are_skipped_not_fatal() {
        let reason = extract_wiki_info(Path::new("/nonexistent/page.md")).expect_err("must skip");
        assert_eq!(reason, SkipReason::MissingFile);
    }

    #[test]
    fn files_without_a_banner_are_skipped() {
        let temp = tempdir().expect("tempdir");
        let path = write_file(temp.path(), "page.md", "# Title\nNo banner here.\n");
        let reason = extract_wiki_info(&path).expect_err("must skip");
        assert_eq!(reason, SkipReason::LinkNotFound);
    }

    #[test]
    fn banners_without_a_wiki_id_are_skipped() {
        let temp = tempdir().expect("tempdir");
        let path = write_file(
            temp.path(),
            "page.md",
            "[Backlog Wiki Link](https://example.backlog.jp/alias/overview)\n",
        );
        let reason = extract_wiki_info(&path).expect_err("must skip");
        assert_eq!(
            reason,
            SkipReason::WikiIdNotFound {
                url: "https://example.backlog.jp/alias/overview".to_string()
            }
        );
    }

    #[test]
    fn batches_preserve_order_and_continue_after_failures() {
        let temp = tempdir().expect("tempdir");
        let good = write_file(temp.path(), "good.md", &format!("# Good\n{BANNER}\n"));
        let bad = temp.path().join("missing.md");
        let also_good = write_file(
            temp.path(),
            "also-good.md",
            &format!("# Also Good\n{BANNER}\n"),
        );

        let report = extract_batch(&[good, bad.clone(), also_good]);
        assert_eq!(report.processed(), 3);
        assert_eq!(report.records().len(), 2);
        let skipped = report.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, bad.display().to_string());
        assert_eq!(*skipped[0].1, SkipReason::MissingFile);
        assert!(matches!(report.outcomes[0], ExtractOutcome::Extracted(_)));
        assert!(matches!(report.outcomes[1], ExtractOutcome::Skipped { .. }));
    }

    #[test]
    fn the_updates_file_holds_one_json_record_per_line() {
        let temp = tempdir().expect("tempdir");
        let first = write_file(temp.path(), "one.md", &format!("# One\n{BANNER}\n"));
        let second = write_file(
            temp.path(),
            "two.md",
            "# Two\n[Backlog Wiki Link](https://example.backlog.jp/alias/wiki/988)\n",
        );
        let output = temp.path().join("wiki_updates.json");

        let report = extract_all(&[first, second], &output).expect("extract all");
        assert_eq!(report.records().len(), 2);

        let body = fs::read_to_string(&output).expect("read output");
        let lines = body.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"wiki_id\":\"987\""));
        let parsed: WikiInfo = serde_json::from_str(lines[1]).expect("parse line");
        assert_eq!(parsed.wiki_id, "988");
        assert_eq!(parsed.wiki_name, "Two");
    }

    #[test]
    fn rerunning_overwrites_instead_of_appending() {
        let temp = tempdir().expect("tempdir");
        let page = write_file(temp.path(), "page.md", &format!("# Page\n{BANNER}\n"));
        let output = temp.path().join("wiki_updates.json");

        extract_all(&[page.clone(), page.clone()], &output).expect("first run");
        extract_all(&[page], &output).expect("second run");

        let body = fs::read_to_string(&output).expect("read output");
        assert_eq!(body.lines().count(), 1);
    }

    #[test]
    fn an_empty_batch_still_truncates_the_output_file() {
        let temp = tempdir().expect("tempdir");
        let output = temp.path().join("wiki_updates.json");
        fs::write(&output, "stale\n").expect("seed output");

        let report = extract_all(&[], &output).expect("extract all");
        assert_eq!(report.processed(), 0);
        assert_eq!(fs::read_to_string(&output).expect("read output"), "");
    }

    #[test]
    fn skip_reasons_render_operator_messages() {
        assert_eq!(
            SkipReason::MissingFile.describe("docs/a.md"),
            "file not found: docs/a.md"
        );
        assert_eq!(
            SkipReason::LinkNotFound.describe("docs/a.md"),
            "no Backlog Wiki Link found in: docs/a.md"
        );
        assert_eq!(
            SkipReason::WikiIdNotFound {
                url: "https://x/y".to_string()
            }
            .describe("docs/a.md"),
            "could not extract a wiki id from URL: https://x/y"
        );
    }
}
