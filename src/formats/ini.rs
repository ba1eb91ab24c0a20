//! INI decoding with extended interpolation
//!
//! Values may reference `${key}` in the same section (or `[DEFAULT]`) and
//! `${section:key}` in any other section; `$$` is a literal dollar sign.
//! Dotted section names and dotted keys are flattened into nested mappings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as Raw};

use crate::error::{ConfigError, ConfigResult};

const DEFAULT_SECTION: &str = "DEFAULT";
const MAX_INTERPOLATION_DEPTH: usize = 10;

static INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:(\$)|\{([^}]*)\})").expect("valid interpolation regex"));

struct Entry {
    key: String,
    lines: Vec<String>,
    line_no: usize,
}

struct Section {
    name: String,
    entries: Vec<Entry>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}

struct Document {
    defaults: Section,
    sections: Vec<Section>,
}

impl Document {
    fn section(&self, name: &str) -> Option<&Section> {
        if name == DEFAULT_SECTION {
            return Some(&self.defaults);
        }
        self.sections.iter().find(|section| section.name == name)
    }
}

pub(super) fn parse(content: &str, source_id: &str) -> ConfigResult<Raw> {
    let doc = read_document(content, source_id)?;

    let mut root = Map::new();
    for section in &doc.sections {
        let section_path: Vec<&str> = section.name.split('.').collect();
        for entry in &section.entries {
            let lines = entry
                .lines
                .iter()
                .map(|line| interpolate(&doc, &section.name, line, 0))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|message| {
                    let location = Some(format!("{}:1", entry.line_no));
                    ConfigError::malformed_at(source_id, location, message)
                })?;

            let value = if lines.len() > 1 {
                Raw::Array(
                    lines.into_iter().filter(|l| !l.is_empty()).map(Raw::String).collect(),
                )
            } else {
                Raw::String(lines.into_iter().next().unwrap_or_default())
            };

            let mut path = section_path.clone();
            path.extend(entry.key.split('.'));
            insert_nested(&mut root, &path, value).map_err(|message| {
                ConfigError::malformed_at(source_id, Some(format!("{}:1", entry.line_no)), message)
            })?;
        }
        if section.entries.is_empty() {
            // Keep empty sections visible so they still select a sub-command.
            ensure_section(&mut root, &section_path).map_err(|message| {
                ConfigError::malformed(source_id, message)
            })?;
        }
    }
    Ok(Raw::Object(root))
}

fn read_document(content: &str, source_id: &str) -> ConfigResult<Document> {
    let mut doc = Document {
        defaults: Section { name: DEFAULT_SECTION.to_string(), entries: Vec::new() },
        sections: Vec::new(),
    };
    // None until the first header; then whether that header was DEFAULT.
    let mut current: Option<bool> = None;
    let mut continuing = false;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();
        let at = |col: usize| Some(format!("{line_no}:{col}"));

        if trimmed.is_empty() {
            continuing = false;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = line.starts_with([' ', '\t']);
        if indented && continuing {
            let section = current_section(&mut doc, current);
            if let Some(entry) = section.and_then(|s| s.entries.last_mut()) {
                entry.lines.push(trimmed.to_string());
                continue;
            }
        }

        if let Some(header) = trimmed.strip_prefix('[') {
            let Some((name, rest)) = header.split_once(']') else {
                return Err(ConfigError::malformed_at(source_id, at(1), "unclosed section header"));
            };
            let rest = rest.trim_start();
            if !(rest.is_empty() || rest.starts_with(['#', ';'])) {
                return Err(ConfigError::malformed_at(
                    source_id,
                    at(1),
                    format!("unexpected text after section header: {rest:?}"),
                ));
            }
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::malformed_at(source_id, at(1), "empty section name"));
            }
            if name == DEFAULT_SECTION {
                current = Some(true);
            } else {
                if doc.sections.iter().any(|s| s.name == name) {
                    return Err(ConfigError::malformed_at(
                        source_id,
                        at(1),
                        format!("section [{name}] appears more than once"),
                    ));
                }
                doc.sections.push(Section { name: name.to_string(), entries: Vec::new() });
                current = Some(false);
            }
            continuing = false;
            continue;
        }

        let Some(split) = trimmed.find(['=', ':']) else {
            return Err(ConfigError::malformed_at(
                source_id,
                at(1),
                format!("expected `key = value`, found {trimmed:?}"),
            ));
        };
        let key = trimmed[..split].trim();
        let value = trimmed[split + 1..].trim();
        if key.is_empty() {
            return Err(ConfigError::malformed_at(source_id, at(1), "empty key"));
        }

        let Some(section) = current_section(&mut doc, current) else {
            return Err(ConfigError::malformed_at(
                source_id,
                at(1),
                "key found before any section header",
            ));
        };
        if section.get(key).is_some() {
            return Err(ConfigError::malformed_at(
                source_id,
                at(1),
                format!("key {key:?} appears more than once in [{}]", section.name),
            ));
        }
        section.entries.push(Entry {
            key: key.to_string(),
            lines: vec![value.to_string()],
            line_no,
        });
        continuing = true;
    }
    Ok(doc)
}

fn current_section(doc: &mut Document, current: Option<bool>) -> Option<&mut Section> {
    match current {
        Some(true) => Some(&mut doc.defaults),
        Some(false) => doc.sections.last_mut(),
        None => None,
    }
}

fn interpolate(
    doc: &Document,
    section: &str,
    value: &str,
    depth: usize,
) -> Result<String, String> {
    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(format!(
            "interpolation nested deeper than {MAX_INTERPOLATION_DEPTH} levels in {value:?} (reference cycle?)"
        ));
    }

    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for caps in INTERPOLATION.captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&value[last..whole.start()]);
        last = whole.end();

        if caps.get(1).is_some() {
            out.push('$');
            continue;
        }
        let reference = caps.get(2).map_or("", |m| m.as_str());
        let (target_section, key) = match reference.split_once(':') {
            Some((sec, key)) => (sec, key),
            None => (section, reference),
        };
        // [DEFAULT] backs up keys of existing sections only.
        let entry = doc
            .section(target_section)
            .and_then(|s| s.get(key).or_else(|| doc.defaults.get(key)))
            .ok_or_else(|| format!("bad interpolation reference ${{{reference}}}"))?;

        let resolved = entry
            .lines
            .iter()
            .map(|line| interpolate(doc, target_section, line, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_str(&resolved.join("\n"));
    }
    out.push_str(&value[last..]);
    Ok(out)
}

fn insert_nested(root: &mut Map<String, Raw>, path: &[&str], value: Raw) -> Result<(), String> {
    let (last, parents) = path.split_last().ok_or_else(|| "empty key".to_string())?;
    let map = ensure_section(root, parents)?;
    if map.contains_key(*last) {
        return Err(format!("{} is defined more than once", path.join(".")));
    }
    map.insert((*last).to_string(), value);
    Ok(())
}

fn ensure_section<'a>(
    root: &'a mut Map<String, Raw>,
    path: &[&str],
) -> Result<&'a mut Map<String, Raw>, String> {
    let mut map = root;
    for (depth, segment) in path.iter().enumerate() {
        let slot = map.entry((*segment).to_string()).or_insert_with(|| Raw::Object(Map::new()));
        map = match slot {
            Raw::Object(inner) => inner,
            _ => {
                return Err(format!(
                    "{} is both a value and a section",
                    path[..=depth].join(".")
                ))
            }
        };
    }
    Ok(map)
}
