//! berea - Bible study notes with doctrine cross-references

pub mod cli;
pub mod domain;
pub mod engine;
pub mod store;

use anyhow::Result;
use clap::Parser;

use cli::{
    Cli, Command, TopicCommand,
    config::Config,
    handlers::{
        handle_backrefs, handle_export, handle_import, handle_list, handle_new, handle_parse,
        handle_passage, handle_rm, handle_search, handle_show, handle_suggest, handle_topic_mv,
        handle_topic_new, handle_topic_rm, handle_topics,
    },
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let db_path = config.db_path(cli.db.as_ref());

    match &cli.command {
        Command::Parse(args) => handle_parse(args),
        Command::New(args) => handle_new(args, &db_path),
        Command::List(args) => handle_list(args, &db_path),
        Command::Show(args) => handle_show(args, &db_path),
        Command::Rm(args) => handle_rm(args, &db_path),
        Command::Search(args) => handle_search(args, &db_path),
        Command::Topics(args) => handle_topics(args, &db_path),
        Command::Topic(TopicCommand::New(args)) => handle_topic_new(args, &db_path),
        Command::Topic(TopicCommand::Mv(args)) => handle_topic_mv(args, &db_path),
        Command::Topic(TopicCommand::Rm(args)) => handle_topic_rm(args, &db_path),
        Command::Passage(args) => handle_passage(args, &db_path),
        Command::Suggest(args) => handle_suggest(args, &db_path),
        Command::Backrefs(args) => handle_backrefs(args, &db_path),
        Command::Export(args) => handle_export(args, &db_path),
        Command::Import(args) => handle_import(args, &db_path),
    }
}
