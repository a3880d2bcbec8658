//! Topic command handlers (topics, topic new/mv/rm).

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use super::{open_store, resolve_topic};
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{TopicMvArgs, TopicNewArgs, TopicRmArgs, TopicsArgs};
use crate::domain::{Topic, TopicId};
use crate::engine::{TopicNode, TopicTaxonomy};

pub fn handle_topics(args: &TopicsArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;
    let forest = TopicTaxonomy::new(&mut store).tree(args.counts)?;

    match args.format {
        OutputFormat::Human => {
            if forest.is_empty() {
                println!("No topics found.");
            } else {
                for node in &forest {
                    print_node(node, 0);
                }
            }
        }
        OutputFormat::Json => {
            let out = Output::new(forest);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn print_node(node: &TopicNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.note_count {
        Some(count) => println!("{}{} ({})", indent, node.topic.name, count),
        None => println!("{}{}", indent, node.topic.name),
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

pub fn handle_topic_new(args: &TopicNewArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;

    let parent = args
        .parent
        .as_deref()
        .map(|arg| resolve_topic(&store, arg))
        .transpose()?;

    let mut topic =
        Topic::new(TopicId::new(), &args.name, Utc::now()).map_err(|e| anyhow::anyhow!("{}", e))?;
    if let Some(parent) = parent {
        topic = topic.under(parent.id);
    }
    store.upsert_topic(&topic)?;
    println!("Created topic {} ({})", topic.name, topic.id);
    Ok(())
}

pub fn handle_topic_mv(args: &TopicMvArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;

    let topic = resolve_topic(&store, &args.topic)?;
    let new_parent = match (&args.parent, args.root) {
        (Some(arg), _) => Some(resolve_topic(&store, arg)?),
        (None, true) => None,
        (None, false) => anyhow::bail!("specify --parent <topic> or --root"),
    };

    TopicTaxonomy::new(&mut store).set_parent(topic.id, new_parent.as_ref().map(|p| p.id))?;
    match new_parent {
        Some(parent) => println!("Moved {} under {}", topic.name, parent.name),
        None => println!("Moved {} to the root", topic.name),
    }
    Ok(())
}

pub fn handle_topic_rm(args: &TopicRmArgs, db_path: &Path) -> Result<()> {
    let mut store = open_store(db_path)?;
    let topic = resolve_topic(&store, &args.topic)?;
    let removed = TopicTaxonomy::new(&mut store).delete(topic.id)?;
    println!("Deleted {} ({} topics removed)", topic.name, removed);
    Ok(())
}
