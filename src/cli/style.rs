//! Terminal colors

use std::str::FromStr;

use clap::ValueEnum;
use console::{style, StyledObject};

use cliconf::config::EnvSnapshot;
use cliconf::domain::Provenance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true).map_err(|_| {
            anyhow::anyhow!("Invalid color mode '{s}' (expected auto, always or never)")
        })
    }
}

/// Explicit color decision, or `None` to let `console` detect the terminal.
///
/// `NO_COLOR` and `FORCE_COLOR` only matter in `auto` mode; a non-empty
/// `NO_COLOR` wins over `FORCE_COLOR`.
pub fn color_override(mode: ColorMode, env: &EnvSnapshot) -> Option<bool> {
    match mode {
        ColorMode::Always => Some(true),
        ColorMode::Never => Some(false),
        ColorMode::Auto => {
            if env.get("NO_COLOR").is_some_and(|v| !v.is_empty()) {
                Some(false)
            } else if env.get("FORCE_COLOR").is_some_and(|v| !v.is_empty() && v != "0") {
                Some(true)
            } else {
                None
            }
        }
    }
}

pub fn apply(mode: ColorMode, env: &EnvSnapshot) {
    if let Some(enabled) = color_override(mode, env) {
        console::set_colors_enabled(enabled);
        console::set_colors_enabled_stderr(enabled);
    }
}

pub fn provenance(provenance: Provenance) -> StyledObject<String> {
    let text = provenance.to_string();
    match provenance {
        Provenance::Cli => style(text).cyan(),
        Provenance::Config => style(text).green(),
        Provenance::EnvVar => style(text).yellow(),
        Provenance::Default => style(text).dim(),
    }
}

pub fn heading(text: &str) -> StyledObject<&str> {
    style(text).bold()
}
