//! Dump command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::utils::resolved_str;
use cliconf::config::{decode_text, FetchError, Fetcher, FsFetcher, Locator, Resolution};
use cliconf::formats::{self, Format};

#[derive(Args)]
pub struct DumpArgs {
    /// Configuration file to parse
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Parse as this format instead of going by extension or content
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub format: Option<Format>,
}

pub fn run(args: &DumpArgs, resolution: &Resolution) -> Result<()> {
    let forced = match resolved_str(resolution, "cliconf.dump.format") {
        Some(text) => Some(text.parse::<Format>().map_err(anyhow::Error::msg)?),
        None => args.format,
    };

    let locator = Locator::parse(&args.file);
    let identity = locator.to_string();
    let bytes = FsFetcher.fetch(&locator).map_err(|err| match err {
        FetchError::NotFound => anyhow::anyhow!("File not found: {identity}"),
        FetchError::Transport(reason) => anyhow::anyhow!("Failed reading {identity}: {reason}"),
    })?;
    let content = decode_text(&bytes, &identity)?;

    let tree = formats::parse_with_hint(&content, forced.or(locator.format_hint()), &identity)
        .with_context(|| format!("Failed parsing {identity}"))?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
