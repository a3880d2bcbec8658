//! Note command handlers (new, ls, show, rm, search).

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::{IsTerminal, Read};
use std::path::Path;

use super::{open_store, parse_reference, resolve_note, resolve_topic};
use crate::cli::output::{NoteListing, Output, OutputFormat};
use crate::cli::{ListArgs, NewArgs, RmArgs, SearchArgs, ShowArgs};
use crate::domain::{Note, NoteId, NoteKind, TopicId};

pub fn handle_new(args: &NewArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;

    let reference = parse_reference(&args.reference)?;
    let kind: NoteKind = args
        .kind
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid kind '{}': {}", args.kind, e))?;

    let content = match &args.content {
        Some(content) => content.clone(),
        None if !std::io::stdin().is_terminal() => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read content from stdin")?;
            buffer
        }
        None => String::new(),
    };

    let primary = args
        .topic
        .as_deref()
        .map(|arg| resolve_topic(&store, arg))
        .transpose()?
        .map(|t| t.id);
    let secondary: Vec<TopicId> = args
        .secondary
        .iter()
        .map(|arg| resolve_topic(&store, arg).map(|t| t.id))
        .collect::<Result<_>>()?;

    let now = Utc::now();
    let note = Note::builder(NoteId::new(), reference, &args.title, now, now)
        .content(content)
        .kind(kind)
        .primary_topic(primary)
        .build()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    store.upsert_note(&note, &secondary)?;
    println!("Created {} {}", note.id(), note);
    Ok(())
}

pub fn handle_list(args: &ListArgs, db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;

    let notes = match &args.passage {
        Some(text) => {
            let reference = parse_reference(text)?;
            store.notes_for_passage(reference.book(), reference.start_chapter())?
        }
        None => store.list_notes()?,
    };

    print_notes(&notes, args.format)
}

pub fn handle_show(args: &ShowArgs, db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    let note = resolve_note(&store, &args.note)?;

    println!("{}", note.title());
    println!("{} · {} · {}", note.reference(), note.kind(), note.id());
    if let Some(topic_id) = note.primary_topic_id()
        && let Some(topic) = store.get_topic(topic_id)?
    {
        println!("Topic: {}", topic.name);
    }
    let secondary = store.note_secondary_topics(note.id())?;
    if !secondary.is_empty() {
        let mut names = Vec::new();
        for id in secondary {
            if let Some(topic) = store.get_topic(id)? {
                names.push(topic.name);
            }
        }
        println!("Also: {}", names.join(", "));
    }
    if !note.content().is_empty() {
        println!();
        println!("{}", note.content());
    }
    Ok(())
}

pub fn handle_rm(args: &RmArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;
    let note = resolve_note(&store, &args.note)?;
    store.delete_note(note.id())?;
    println!("Deleted {}", note);
    Ok(())
}

pub fn handle_search(args: &SearchArgs, db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    let notes = store.search_notes(&args.query)?;
    print_notes(&notes, args.format)
}

fn print_notes(notes: &[Note], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes found.");
            } else {
                for note in notes {
                    println!("{}  {}", note.id(), note);
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
