//! Backup command handlers (export, import).

use anyhow::{Context, Result};
use std::path::Path;

use super::open_store;
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{ExportArgs, ImportArgs};
use crate::engine::{BackupEngine, ImportReport, Snapshot};

pub fn handle_export(args: &ExportArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;
    let snapshot = BackupEngine::new(&mut store).export_all()?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
            println!(
                "Exported {} notes, {} topics to {}",
                snapshot.statistics.note_count,
                snapshot.statistics.topic_count,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn handle_import(args: &ImportArgs, db_path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read snapshot from {}", args.input.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse snapshot {}", args.input.display()))?;

    let mut store = open_store(db_path)?;
    let report = BackupEngine::new(&mut store).import_all(&snapshot)?;

    match args.format {
        OutputFormat::Human => print_report(&report),
        OutputFormat::Json => {
            let out = Output::new(report);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!(
        "Imported: {} inserted, {} updated",
        report.inserted.total(),
        report.updated.total()
    );
    println!(
        "  notes {}/{}, topics {}/{}, series {}/{}, annotations {}/{}, tag types {}/{}",
        report.inserted.notes,
        report.updated.notes,
        report.inserted.topics,
        report.updated.topics,
        report.inserted.series,
        report.updated.series,
        report.inserted.annotations,
        report.updated.annotations,
        report.inserted.tag_types,
        report.updated.tag_types,
    );
    if !report.errors.is_empty() {
        eprintln!("{} rows skipped:", report.errors.len());
        for error in &report.errors {
            eprintln!("  {:?} {}: {}", error.kind, error.id, error.error);
        }
    }
}
