//! Configuration file formats
//!
//! Each format decodes text into the same generic tree (a
//! [`serde_json::Value`]). Selection goes: explicit format, then file
//! extension, then content sniffing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value as Raw;

use crate::error::{ConfigError, ConfigResult};

mod ini;
mod jsonc;
mod toml_file;
mod xml;
mod yaml_file;

/// Supported configuration formats, in default search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Toml,
    Yaml,
    Json,
    Ini,
    Xml,
}

/// Order in which `<stem>.<ext>` candidates are probed.
pub const SEARCH_ORDER: [Format; 5] =
    [Format::Toml, Format::Yaml, Format::Json, Format::Ini, Format::Xml];

/// Order in which formats are tried when nothing else identifies the content.
/// YAML accepts almost any text, so it goes last.
const SNIFF_ORDER: [Format; 5] =
    [Format::Json, Format::Xml, Format::Toml, Format::Ini, Format::Yaml];

impl Format {
    /// Conventional file extensions, preferred spelling first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Toml => &["toml"],
            Format::Yaml => &["yaml", "yml"],
            Format::Json => &["json", "jsonc", "json5"],
            Format::Ini => &["ini", "cfg", "conf"],
            Format::Xml => &["xml"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Ini => "ini",
            Format::Xml => "xml",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        SEARCH_ORDER.into_iter().find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Format implied by a path or URL, ignoring any query string.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        Path::new(path).extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }

    /// Decode `content` with this format.
    pub fn parse(self, content: &str, source_id: &str) -> ConfigResult<Raw> {
        match self {
            Format::Toml => toml_file::parse(content, source_id),
            Format::Yaml => yaml_file::parse(content, source_id),
            Format::Json => jsonc::parse(content, source_id),
            Format::Ini => ini::parse(content, source_id),
            Format::Xml => xml::parse(content, source_id),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| format!("unknown configuration format '{s}'"))
    }
}

/// Parse `content`, choosing the format from the hint or by sniffing.
pub fn parse_with_hint(content: &str, hint: Option<Format>, source_id: &str) -> ConfigResult<Raw> {
    match hint {
        Some(format) => format.parse(content, source_id),
        None => sniff(content, source_id).map(|(_, tree)| tree),
    }
}

/// Try every format in [`SNIFF_ORDER`] and keep the first that yields a mapping.
pub fn sniff(content: &str, source_id: &str) -> ConfigResult<(Format, Raw)> {
    for format in SNIFF_ORDER {
        match format.parse(content, source_id) {
            Ok(tree @ Raw::Object(_)) => {
                tracing::debug!(
                    source = source_id,
                    format = %format,
                    "sniffed configuration format"
                );
                return Ok((format, tree));
            }
            Ok(_) | Err(_) => continue,
        }
    }
    let tried: Vec<&str> = SNIFF_ORDER.iter().map(|f| f.name()).collect();
    Err(ConfigError::malformed(
        source_id,
        format!("content is not valid in any supported format (tried {})", tried.join(", ")),
    ))
}

/// 1-based `line:column` of a byte offset.
pub(crate) fn line_col(content: &str, offset: usize) -> String {
    let offset = offset.min(content.len());
    let before = &content.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = before.iter().rev().take_while(|&&b| b != b'\n').count() + 1;
    format!("{line}:{column}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(Format::from_extension("YML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("jsonc"), Some(Format::Json));
        assert_eq!(Format::from_extension("txt"), None);
        assert_eq!(Format::from_path("https://example.com/conf.toml?raw=1"), Some(Format::Toml));
        assert_eq!(Format::from_path("/etc/prog/config"), None);
    }

    #[test]
    fn test_sniffing_detects_each_format() {
        let cases = [
            ("{\"prog\": {\"level\": 3}}", Format::Json),
            ("<prog><level>3</level></prog>", Format::Xml),
            ("[prog]\nlevel = 3\n", Format::Toml),
            ("[prog]\nlevel: three\nname = x y\n", Format::Ini),
            ("prog:\n  level: 3\n", Format::Yaml),
        ];
        for (content, expected) in cases {
            let (format, _) = sniff(content, "remote").expect("sniff");
            assert_eq!(format, expected, "content: {content}");
        }
    }

    #[test]
    fn test_sniffing_failure_names_every_format() {
        let err = sniff("just some words", "remote").unwrap_err();
        let message = err.to_string();
        for name in ["json", "xml", "toml", "ini", "yaml"] {
            assert!(message.contains(name), "missing {name} in {message}");
        }
    }

    #[test]
    fn test_hint_skips_sniffing() {
        let tree = parse_with_hint("prog:\n  level: 3\n", Some(Format::Yaml), "f").unwrap();
        assert_eq!(tree, json!({"prog": {"level": 3}}));
    }

    #[test]
    fn test_line_col_is_one_based() {
        assert_eq!(line_col("ab\ncd", 0), "1:1");
        assert_eq!(line_col("ab\ncd", 4), "2:2");
    }
}
