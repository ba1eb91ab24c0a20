//! cliconf: inspect how command-line options resolve from config files,
//! environment variables and defaults

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
