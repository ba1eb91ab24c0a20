//! Configuration discovery, filtering and merging
//!
//! Resolves every declared parameter from the command line, a configuration
//! file, environment variables and defaults, with precedence
//! CLI > config file > environment > defaults.

pub mod env;
pub mod loader;
pub mod locate;
pub mod merge;
pub mod normalize;

pub use env::{derive_name, env_values, EnvBinding, EnvSnapshot, EnvVarMap};
pub use loader::{LoadedConfig, Resolution, Resolver};
pub use locate::{
    decode_text, default_config_dir, FetchError, Fetcher, FsFetcher, LoadedSource, Locator,
    SearchRules, SourceLocator,
};
pub use merge::merge;
pub use normalize::{normalize, Normalized};
