//! Parse command handler.

use anyhow::Result;

use super::parse_reference;
use crate::cli::ParseArgs;
use crate::cli::output::{Output, OutputFormat};

pub fn handle_parse(args: &ParseArgs) -> Result<()> {
    let reference = parse_reference(&args.reference)?;

    match args.format {
        OutputFormat::Human => {
            println!("{}", reference);
        }
        OutputFormat::Json => {
            let out = Output::new(reference);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
