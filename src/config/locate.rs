//! Configuration source discovery
//!
//! An explicit path or URL must exist. Without one, the per-platform
//! application config directory is probed for `<stem>.<ext>` over every
//! format's extensions, or for files matching a glob pattern.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use encoding_rs::Encoding;
use globset::Glob;

use crate::error::{ConfigError, ConfigResult};
use crate::formats::{Format, SEARCH_ORDER};

/// Default file stem probed in the config directory.
pub const DEFAULT_STEM: &str = "config";

/// Where configuration bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Path(PathBuf),
    Url(String),
}

impl Locator {
    /// Interpret user input as a URL (`http://`, `https://`, `file://`) or a path.
    pub fn parse(input: &str) -> Self {
        if let Some(path) = input.strip_prefix("file://") {
            return Locator::Path(PathBuf::from(path));
        }
        if input.starts_with("http://") || input.starts_with("https://") {
            return Locator::Url(input.to_string());
        }
        Locator::Path(expand_home(input))
    }

    pub fn format_hint(&self) -> Option<Format> {
        match self {
            Locator::Path(path) => path.to_str().and_then(Format::from_path),
            Locator::Url(url) => Format::from_path(url),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Path(path) => write!(f, "{}", path.display()),
            Locator::Url(url) => f.write_str(url),
        }
    }
}

fn expand_home(input: &str) -> PathBuf {
    let rest = match input.strip_prefix("~/") {
        Some(rest) => rest,
        None if input == "~" => "",
        None => return PathBuf::from(input),
    };
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => PathBuf::from(input),
    }
}

/// Why a fetch produced no bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    NotFound,
    Transport(String),
}

/// Byte source for configuration content.
///
/// Implementations that reach the network should enforce their own timeout.
pub trait Fetcher {
    fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, FetchError>;
}

/// Reads local files. URLs need an injected [`Fetcher`] with a transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl Fetcher for FsFetcher {
    fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, FetchError> {
        match locator {
            Locator::Path(path) => std::fs::read(path).map_err(|err| match err.kind() {
                ErrorKind::NotFound => FetchError::NotFound,
                _ => FetchError::Transport(err.to_string()),
            }),
            Locator::Url(url) => {
                Err(FetchError::Transport(format!("no remote transport configured for {url}")))
            }
        }
    }
}

/// Search rules for one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRules {
    /// Explicit path or URL; must resolve.
    pub explicit: Option<String>,
    /// Glob matched against file names in the search directory.
    pub pattern: Option<String>,
    /// Search directory; defaults to the application config directory.
    pub directory: Option<PathBuf>,
    pub stem: String,
}

impl Default for SearchRules {
    fn default() -> Self {
        Self { explicit: None, pattern: None, directory: None, stem: DEFAULT_STEM.to_string() }
    }
}

/// Bytes of a located configuration source, decoded to text.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    pub identity: String,
    pub content: String,
    pub format: Option<Format>,
}

/// Per-platform configuration directory for `app_name`.
pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
    ProjectDirs::from("", "", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

pub struct SourceLocator<'a> {
    app_name: &'a str,
    rules: &'a SearchRules,
    fetcher: &'a dyn Fetcher,
}

impl<'a> SourceLocator<'a> {
    pub fn new(app_name: &'a str, rules: &'a SearchRules, fetcher: &'a dyn Fetcher) -> Self {
        Self { app_name, rules, fetcher }
    }

    pub fn search_dir(&self) -> Option<PathBuf> {
        self.rules.directory.clone().or_else(|| default_config_dir(self.app_name))
    }

    /// Ordered candidates probed when no explicit source is given.
    pub fn candidates(&self) -> ConfigResult<Vec<Locator>> {
        let Some(dir) = self.search_dir() else {
            return Ok(Vec::new());
        };

        if let Some(pattern) = &self.rules.pattern {
            return Ok(glob_candidates(&dir, pattern)?.into_iter().map(Locator::Path).collect());
        }

        Ok(SEARCH_ORDER
            .iter()
            .flat_map(|format| format.extensions().iter())
            .map(|ext| Locator::Path(dir.join(format!("{}.{ext}", self.rules.stem))))
            .collect())
    }

    /// Resolve the configuration source.
    ///
    /// `Ok(None)` means nothing was found and nothing was explicitly required.
    pub fn locate(&self) -> ConfigResult<Option<LoadedSource>> {
        if let Some(explicit) = &self.rules.explicit {
            let locator = Locator::parse(explicit);
            let identity = locator.to_string();
            let bytes = self.fetcher.fetch(&locator).map_err(|err| {
                let reason = match err {
                    FetchError::NotFound => "no such file".to_string(),
                    FetchError::Transport(reason) => reason,
                };
                ConfigError::SourceUnavailable { source_id: identity.clone(), reason }
            })?;
            return load(locator, bytes).map(Some);
        }

        for locator in self.candidates()? {
            match self.fetcher.fetch(&locator) {
                Ok(bytes) => {
                    tracing::debug!(source = %locator, "found configuration file");
                    return load(locator, bytes).map(Some);
                }
                Err(FetchError::NotFound) => continue,
                Err(FetchError::Transport(reason)) => {
                    tracing::debug!(source = %locator, %reason, "skipping unreadable candidate");
                    continue;
                }
            }
        }
        tracing::debug!(app = self.app_name, "no configuration file found");
        Ok(None)
    }
}

fn load(locator: Locator, bytes: Vec<u8>) -> ConfigResult<LoadedSource> {
    let identity = locator.to_string();
    let content = decode_text(&bytes, &identity)?;
    Ok(LoadedSource { identity, content, format: locator.format_hint() })
}

fn glob_candidates(dir: &Path, pattern: &str) -> ConfigResult<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .map_err(|err| ConfigError::SourceUnavailable {
            source_id: pattern.to_string(),
            reason: format!("invalid search pattern: {err}"),
        })?
        .compile_matcher();

    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(Vec::new());
    };
    let mut matches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .filter(|entry| matcher.is_match(entry.file_name()))
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    Ok(matches)
}

/// Decode configuration bytes, honoring a UTF-8 or UTF-16 byte-order mark.
pub fn decode_text(bytes: &[u8], source_id: &str) -> ConfigResult<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .map(|text| text.into_owned())
            .ok_or_else(|| {
                ConfigError::malformed(source_id, format!("invalid {} content", encoding.name()))
            });
    }
    std::str::from_utf8(bytes).map(str::to_string).map_err(|err| {
        ConfigError::malformed(source_id, format!("content is not valid UTF-8: {err}"))
    })
}
