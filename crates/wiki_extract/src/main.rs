use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use backlog_wiki_core::extract::{self, ExtractOutcome, ExtractReport, WIKI_UPDATES_FILE};
use clap::{CommandFactory, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "wiki_extract",
    version,
    about = "Extract Backlog wiki ids and names from exported Markdown files",
    after_help = "Examples:\n  wiki_extract docs/setup.md docs/release-notes.md\n  wiki_extract $(git diff --name-only HEAD~1 -- 'docs/*.md')"
)]
struct Cli {
    #[arg(value_name = "FILE", help = "Markdown files to scan")]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.files.is_empty() {
        let mut command = Cli::command();
        command.print_help()?;
        println!();
        process::exit(1);
    }

    println!("processing {} files...", cli.files.len());
    let report = extract::extract_all(&cli.files, Path::new(WIKI_UPDATES_FILE))?;
    render_report(&report);
    Ok(())
}

fn render_report(report: &ExtractReport) {
    for outcome in &report.outcomes {
        match outcome {
            ExtractOutcome::Extracted(info) => {
                println!("processing: {}", info.file_path);
                println!("extracted: wiki {} ({})", info.wiki_id, info.wiki_name);
            }
            ExtractOutcome::Skipped { file_path, reason } => {
                println!("processing: {file_path}");
                eprintln!("warning: {}", reason.describe(file_path));
                println!("failed to extract from: {file_path}");
            }
        }
    }

    println!();
    println!("files_processed: {}", report.processed());
    println!("records_extracted: {}", report.records().len());
    println!("output: {WIKI_UPDATES_FILE}");

    let skipped = report.skipped();
    if !skipped.is_empty() {
        println!("files_skipped: {}", skipped.len());
        println!("skipped files:");
        for (file_path, _) in &skipped {
            println!("  - {file_path}");
        }
    }
}
