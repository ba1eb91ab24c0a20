//! Locate command implementation

use anyhow::Result;

use super::style;
use cliconf::config::{Resolution, Resolver};

pub fn run(resolver: &Resolver<'_>, resolution: &Resolution) -> Result<()> {
    let locator = resolver.locator();

    match locator.search_dir() {
        Some(dir) => println!("{} {}", style::heading("Search directory:"), dir.display()),
        None => println!("{} none (no home directory)", style::heading("Search directory:")),
    }

    println!("{}", style::heading("Candidates:"));
    for candidate in locator.candidates()? {
        let candidate = candidate.to_string();
        let selected = resolution.source.as_deref() == Some(candidate.as_str());
        if selected {
            println!("  * {}", console::style(candidate).green());
        } else {
            println!("    {candidate}");
        }
    }

    match (&resolution.source, resolution.format) {
        (Some(source), Some(format)) => {
            println!("{} {source} ({format})", style::heading("Selected:"))
        }
        (Some(source), None) => println!("{} {source}", style::heading("Selected:")),
        (None, _) => println!("{} none", style::heading("Selected:")),
    }
    Ok(())
}
