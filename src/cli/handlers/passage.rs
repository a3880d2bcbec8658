//! Passage lookup handlers (passage, suggest, backrefs).

use anyhow::{Result, bail};
use std::path::Path;

use super::{open_store, parse_reference, passage_parts};
use crate::cli::output::{DoctrineListing, NoteListing, Output, OutputFormat};
use crate::cli::{BackrefsArgs, PassageArgs, SuggestArgs};
use crate::domain::SystematicRef;
use crate::engine::{DoctrineIndex, SuggestionSource};

pub fn handle_passage(args: &PassageArgs, db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    let reference = parse_reference(&args.reference)?;
    let (book, chapter, verse) = passage_parts(reference);

    let index = DoctrineIndex::new(&store);
    let doctrines = index.doctrines_for_passage(book, chapter, verse)?;
    let notes = store.notes_for_passage(book, chapter)?;

    match args.format {
        OutputFormat::Human => {
            if doctrines.is_empty() {
                println!("No doctrines indexed for {}.", reference);
            } else {
                println!("Doctrines for {}:", reference);
                for entry in &doctrines {
                    match entry.reference() {
                        Some(r) => println!("  {}  {}", r, entry.title),
                        None => println!("  {}", entry.title),
                    }
                }
            }
            if !notes.is_empty() {
                println!("Notes:");
                for note in &notes {
                    println!("  {}  {}", note.id(), note);
                }
            }
        }
        OutputFormat::Json => {
            let listings: Vec<DoctrineListing> = doctrines
                .iter()
                .map(|entry| DoctrineListing {
                    reference: entry.reference().map(|r| r.to_string()),
                    title: entry.title.clone(),
                    summary: entry.summary.clone(),
                })
                .collect();
            let out = Output::new(listings);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

pub fn handle_suggest(args: &SuggestArgs, db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    let reference = parse_reference(&args.reference)?;
    let (book, chapter, verse) = passage_parts(reference);

    let suggestions = DoctrineIndex::new(&store).suggest_topics_for_passage(book, chapter, verse)?;

    match args.format {
        OutputFormat::Human => {
            if suggestions.is_empty() {
                println!("No topic suggestions for {}.", reference);
            } else {
                for suggestion in &suggestions {
                    let source = match suggestion.source {
                        SuggestionSource::Doctrine => "doctrine",
                        SuggestionSource::ExistingNotes => "existing notes",
                    };
                    println!("{}  [{}]", suggestion.topic.name, source);
                }
            }
        }
        OutputFormat::Json => {
            let out = Output::new(suggestions);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

pub fn handle_backrefs(args: &BackrefsArgs, db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;

    let systematic_ref: SystematicRef = args
        .entry
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid entry reference '{}': {}", args.entry, e))?;
    let Some(entry) = store.get_entry_by_ref(systematic_ref)? else {
        bail!("no systematic entry at {}", systematic_ref);
    };

    let notes = DoctrineIndex::new(&store).notes_referencing(entry.id)?;

    match args.format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes link to {} ({}).", systematic_ref, entry.title);
            } else {
                println!("Notes linking to {} ({}):", systematic_ref, entry.title);
                for note in &notes {
                    println!("  {}  {}", note.id(), note);
                }
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes
                .iter()
                .map(|note| NoteListing {
                    id: note.id().to_string(),
                    title: note.title().to_string(),
                    reference: note.reference().to_string(),
                    kind: note.kind().to_string(),
                })
                .collect();
            let out = Output::new(listings);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
