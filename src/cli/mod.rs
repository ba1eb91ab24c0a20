//! Command-line interface for cliconf
//!
//! The tool resolves its own options through the library, so every option
//! below (except the ones that choose the configuration source) can also be
//! set from a `[cliconf]` configuration section or a `CLICONF_*` variable.

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use cliconf::config::{EnvSnapshot, Resolution, Resolver};
use cliconf::formats::Format;
use cliconf::params::{CliValues, ParameterTree};

mod completions;
mod dump;
mod envvars;
mod locate;
mod params;
mod style;
mod utils;

use style::ColorMode;

/// Options that decide how the configuration source itself is read.
const BOOTSTRAP_IDS: &[&str] = &["config", "no_config", "config_format", "strict"];

/// Resolve command-line options from config files, environment variables and defaults
#[derive(Parser)]
#[command(name = "cliconf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path or URL (skips the default search)
    #[arg(short, long, global = true, value_name = "FILE", env = "CLICONF_CONFIG")]
    config: Option<String>,

    /// Do not read any configuration file
    #[arg(long, global = true)]
    no_config: bool,

    /// Parse the configuration file as this format instead of guessing
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    config_format: Option<Format>,

    /// Fail on configuration keys that match no option
    #[arg(long, global = true)]
    strict: bool,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// When to color output
    #[arg(
        long,
        global = true,
        value_enum,
        value_name = "WHEN",
        default_value_t = ColorMode::Auto
    )]
    color: ColorMode,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every option of this tool and show where each value came from
    Params(params::ParamsArgs),

    /// Show the configuration search plan and the file that gets read
    Locate,

    /// List the environment variables each option reads
    Envvars,

    /// Parse a configuration file and print its raw tree as JSON
    Dump(dump::DumpArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

pub fn run() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    // The filter is reloadable so a `verbose` value from the config file applies too.
    let (filter, log_handle) = reload::Layer::new(log_filter(cli.verbose));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let tree = ParameterTree::from_command(&Cli::command(), BOOTSTRAP_IDS);
    let cli_values = CliValues::from_matches(&tree, &matches).map_err(anyhow::Error::msg)?;
    let env = EnvSnapshot::capture();
    let resolver = Resolver::new(&tree)
        .explicit(cli.config.clone())
        .no_config(cli.no_config)
        .format(cli.config_format)
        .strict(cli.strict);
    let resolution =
        resolver.resolve(&cli_values, &env).context("Failed to resolve configuration")?;

    let verbose = utils::resolved_bool(&resolution, "cliconf.verbose").unwrap_or(cli.verbose);
    if verbose != cli.verbose {
        set_verbosity(&log_handle, verbose);
    }
    style::apply(resolved_color(&resolution, cli.color)?, &env);

    match cli.command {
        Commands::Params(args) => params::run(&args, &resolution),
        Commands::Locate => locate::run(&resolver, &resolution),
        Commands::Envvars => envvars::run(&tree, &env),
        Commands::Dump(args) => dump::run(&args, &resolution),
        Commands::Completions(args) => completions::run(&args),
    }
}

fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    EnvFilter::from_default_env().add_directive(level.into())
}

/// Swap the active log filter; returns false (after a warning) when the
/// subscriber holding it is gone.
fn set_verbosity<S>(handle: &reload::Handle<EnvFilter, S>, verbose: bool) -> bool {
    match handle.reload(log_filter(verbose)) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "could not apply the configured log level");
            false
        }
    }
}

fn resolved_color(resolution: &Resolution, fallback: ColorMode) -> Result<ColorMode> {
    match utils::resolved_str(resolution, "cliconf.color") {
        Some(text) => text.parse(),
        None => Ok(fallback),
    }
}
