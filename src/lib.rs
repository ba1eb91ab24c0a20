//! cliconf: configuration files, environment variables and precedence
//! resolution for clap command lines
//!
//! Every declared parameter resolves from, in order of precedence, the
//! command line, a configuration file (TOML, YAML, JSON with comments, INI or
//! XML), an environment variable, and finally its default.
//!
//! ```no_run
//! use clap::{Arg, ArgAction, Command};
//! use cliconf::config::{EnvSnapshot, Resolver};
//! use cliconf::params::{CliValues, ParameterTree};
//!
//! let command = Command::new("prog")
//!     .arg(Arg::new("config").long("config"))
//!     .arg(Arg::new("flag").long("flag").action(ArgAction::SetTrue));
//! let matches = command.clone().get_matches();
//!
//! let tree = ParameterTree::from_command(&command, &["config"]);
//! let cli = CliValues::from_matches(&tree, &matches).expect("command-line values");
//! let resolution = Resolver::new(&tree)
//!     .explicit(matches.get_one::<String>("config").cloned())
//!     .resolve(&cli, &EnvSnapshot::capture())
//!     .expect("configuration");
//! println!("{:?}", resolution.values["prog.flag"]);
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod formats;
pub mod params;

pub use config::{EnvSnapshot, Resolution, Resolver, SearchRules};
pub use domain::{ParamKind, Provenance, ResolvedValue, ResolvedValues, ScalarKind, Value};
pub use error::{ConfigError, ConfigResult};
pub use formats::Format;
pub use params::{CliValues, ParameterTree};
