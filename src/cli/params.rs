//! Params command implementation

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::json;

use super::style;
use super::utils::{display_value, resolved_str};
use cliconf::config::Resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args)]
pub struct ParamsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

pub fn run(args: &ParamsArgs, resolution: &Resolution) -> Result<()> {
    let output = match resolved_str(resolution, "cliconf.params.output") {
        Some(text) => OutputFormat::from_str(text, true).map_err(|_| {
            anyhow::anyhow!("Invalid output format '{text}' (expected table or json)")
        })?,
        None => args.output,
    };

    match output {
        OutputFormat::Json => print_json(resolution),
        OutputFormat::Table => {
            print_table(resolution);
            Ok(())
        }
    }
}

fn print_json(resolution: &Resolution) -> Result<()> {
    let doc = json!({
        "source": resolution.source,
        "format": resolution.format,
        "values": resolution.values,
        "unmatched": resolution.unmatched,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn print_table(resolution: &Resolution) {
    match &resolution.source {
        Some(source) => println!("{} {}", style::heading("Configuration:"), source),
        None => println!("{} none", style::heading("Configuration:")),
    }

    let width = resolution.values.keys().map(String::len).max().unwrap_or(0);
    let rendered: Vec<String> =
        resolution.values.values().map(|resolved| display_value(resolved.value.as_ref())).collect();
    let value_width = rendered.iter().map(String::len).max().unwrap_or(0);

    for ((path, resolved), value) in resolution.values.iter().zip(&rendered) {
        println!(
            "  {path:<width$}  {value:<value_width$}  {}",
            style::provenance(resolved.provenance)
        );
    }

    if !resolution.unmatched.is_empty() {
        println!("{}", style::heading("Ignored keys:"));
        for key in &resolution.unmatched {
            println!("  {key}");
        }
    }
}
