//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use output::OutputFormat;

/// berea - Bible study notes with doctrine cross-references
#[derive(Parser, Debug)]
#[command(name = "berea", version, about, long_about = None)]
pub struct Cli {
    /// Database file (overrides config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a free-text verse reference
    Parse(ParseArgs),

    /// Create a new note on a passage
    New(NewArgs),

    /// List notes
    #[command(name = "ls")]
    List(ListArgs),

    /// Show a note's contents
    Show(ShowArgs),

    /// Delete a note
    Rm(RmArgs),

    /// Full-text search across notes
    Search(SearchArgs),

    /// Show the topic tree
    Topics(TopicsArgs),

    /// Manage individual topics
    #[command(subcommand)]
    Topic(TopicCommand),

    /// Show doctrines and notes for a passage
    Passage(PassageArgs),

    /// Suggest topics for a passage
    Suggest(SuggestArgs),

    /// Show notes linking to a systematic entry
    Backrefs(BackrefsArgs),

    /// Export the whole dataset to a JSON snapshot
    Export(ExportArgs),

    /// Import a JSON snapshot
    Import(ImportArgs),
}

#[derive(Subcommand, Debug)]
pub enum TopicCommand {
    /// Create a topic
    New(TopicNewArgs),

    /// Move a topic under a new parent (or to the root)
    Mv(TopicMvArgs),

    /// Delete a topic and its descendants
    Rm(TopicRmArgs),
}

/// Arguments for the `parse` command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Reference text, e.g. "Romans 3:21-26"
    pub reference: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Passage the note is attached to, e.g. "Romans 3:21-26"
    pub reference: String,

    /// Note title
    pub title: String,

    /// Note content (reads stdin when omitted and not a TTY)
    #[arg(short, long)]
    pub content: Option<String>,

    /// Note kind: note, commentary, or sermon
    #[arg(short, long, default_value = "note")]
    pub kind: String,

    /// Primary topic (id or exact name)
    #[arg(short = 'T', long)]
    pub topic: Option<String>,

    /// Secondary topic (id or exact name, can be specified multiple times)
    #[arg(long = "also", action = ArgAction::Append)]
    pub secondary: Vec<String>,
}

/// Arguments for the `ls` (list) command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only notes on this passage, e.g. "Romans 3"
    #[arg(short, long)]
    pub passage: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note ID or exact title
    pub note: String,
}

/// Arguments for the `rm` command
#[derive(Parser, Debug)]
pub struct RmArgs {
    /// Note ID or exact title
    pub note: String,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `topics` command
#[derive(Parser, Debug)]
pub struct TopicsArgs {
    /// Show note counts for each topic (rollup over the subtree)
    #[arg(long)]
    pub counts: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `topic new` command
#[derive(Parser, Debug)]
pub struct TopicNewArgs {
    /// Topic name
    pub name: String,

    /// Parent topic (id or exact name)
    #[arg(short, long)]
    pub parent: Option<String>,
}

/// Arguments for the `topic mv` command
#[derive(Parser, Debug)]
pub struct TopicMvArgs {
    /// Topic to move (id or exact name)
    pub topic: String,

    /// New parent (id or exact name)
    #[arg(short, long, conflicts_with = "root")]
    pub parent: Option<String>,

    /// Move to the root of the tree
    #[arg(long)]
    pub root: bool,
}

/// Arguments for the `topic rm` command
#[derive(Parser, Debug)]
pub struct TopicRmArgs {
    /// Topic to delete (id or exact name)
    pub topic: String,
}

/// Arguments for the `passage` command
#[derive(Parser, Debug)]
pub struct PassageArgs {
    /// Passage, e.g. "Romans 3:24"
    pub reference: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `suggest` command
#[derive(Parser, Debug)]
pub struct SuggestArgs {
    /// Passage, e.g. "Romans 3:24"
    pub reference: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `backrefs` command
#[derive(Parser, Debug)]
pub struct BackrefsArgs {
    /// Systematic entry reference, e.g. "Ch36" or "Ch32:A.1"
    pub entry: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `export` command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `import` command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Snapshot file to import
    pub input: PathBuf,

    /// Output format for the import report
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}
