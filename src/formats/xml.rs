//! XML decoding
//!
//! The root element becomes the single top-level key. Child elements become
//! mapping keys, repeated siblings with the same tag become a sequence, leaf
//! text becomes a string and empty elements become null. Attributes are
//! ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value as Raw};

use super::line_col;
use crate::error::{ConfigError, ConfigResult};

struct Frame {
    name: String,
    children: Map<String, Raw>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self { name, children: Map::new(), text: String::new() }
    }

    fn into_value(self) -> Raw {
        if !self.children.is_empty() {
            return Raw::Object(self.children);
        }
        let text = self.text.trim();
        if text.is_empty() {
            Raw::Null
        } else {
            Raw::String(text.to_string())
        }
    }
}

pub(super) fn parse(content: &str, source_id: &str) -> ConfigResult<Raw> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Raw)> = None;

    loop {
        let at = |pos: u64| Some(line_col(content, pos as usize));
        let event = reader.read_event().map_err(|err| {
            let position = reader.error_position() as u64;
            ConfigError::malformed_at(source_id, at(position), err.to_string())
        })?;
        let position = reader.buffer_position() as u64;

        match event {
            Event::Start(start) => {
                stack.push(Frame::new(element_name(start.name().as_ref())));
            }
            Event::Empty(start) => {
                let frame = Frame::new(element_name(start.name().as_ref()));
                close(frame, &mut stack, &mut root).map_err(|message| {
                    ConfigError::malformed_at(source_id, at(position), message)
                })?;
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| {
                    ConfigError::malformed_at(source_id, at(position), "unexpected closing tag")
                })?;
                close(frame, &mut stack, &mut root).map_err(|message| {
                    ConfigError::malformed_at(source_id, at(position), message)
                })?;
            }
            Event::Text(text) => {
                let text = String::from_utf8_lossy(&text);
                let unescaped = quick_xml::escape::unescape(&text).map_err(|err| {
                    ConfigError::malformed_at(source_id, at(position), err.to_string())
                })?;
                push_text(&mut stack, &unescaped).map_err(|message| {
                    ConfigError::malformed_at(source_id, at(position), message)
                })?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data);
                push_text(&mut stack, &text).map_err(|message| {
                    ConfigError::malformed_at(source_id, at(position), message)
                })?;
            }
            Event::GeneralRef(reference) => {
                let entity = format!("&{};", String::from_utf8_lossy(&reference));
                let resolved = quick_xml::escape::unescape(&entity).map_err(|err| {
                    ConfigError::malformed_at(source_id, at(position), err.to_string())
                })?;
                push_text(&mut stack, &resolved).map_err(|message| {
                    ConfigError::malformed_at(source_id, at(position), message)
                })?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ConfigError::malformed(
            source_id,
            format!("element <{}> is never closed", open.name),
        ));
    }
    let (name, value) =
        root.ok_or_else(|| ConfigError::malformed(source_id, "document has no root element"))?;
    let mut map = Map::new();
    map.insert(name, value);
    Ok(Raw::Object(map))
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn push_text(stack: &mut [Frame], text: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err("text outside the root element".to_string()),
    }
}

fn close(
    frame: Frame,
    stack: &mut [Frame],
    root: &mut Option<(String, Raw)>,
) -> Result<(), String> {
    let name = frame.name.clone();
    let value = frame.into_value();
    match stack.last_mut() {
        Some(parent) => {
            add_child(&mut parent.children, name, value);
            Ok(())
        }
        None if root.is_some() => Err(format!("second root element <{name}>")),
        None => {
            *root = Some((name, value));
            Ok(())
        }
    }
}

fn add_child(children: &mut Map<String, Raw>, name: String, value: Raw) {
    match children.get_mut(&name) {
        Some(Raw::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Raw::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_elements_become_nested_mappings() {
        let content = "<?xml version=\"1.0\"?>\n<prog>\n  <flag>true</flag>\n  <serve><port>80</port></serve>\n</prog>\n";
        assert_eq!(
            parse(content, "c.xml").unwrap(),
            json!({"prog": {"flag": "true", "serve": {"port": "80"}}})
        );
    }

    #[test]
    fn test_repeated_siblings_become_a_sequence() {
        let content = "<prog><tag>a</tag><tag>b</tag><tag>c</tag><name>x</name></prog>";
        assert_eq!(
            parse(content, "c.xml").unwrap(),
            json!({"prog": {"tag": ["a", "b", "c"], "name": "x"}})
        );
    }

    #[test]
    fn test_attributes_are_ignored() {
        let with_attrs =
            "<prog version=\"2\"><flag kind=\"bool\">true</flag><serve port=\"1\"><port>80</port></serve></prog>";
        let without_attrs = "<prog><flag>true</flag><serve><port>80</port></serve></prog>";
        assert_eq!(parse(with_attrs, "c.xml").unwrap(), parse(without_attrs, "c.xml").unwrap());
    }

    #[test]
    fn test_empty_elements_are_null_and_entities_resolve() {
        let content = "<prog><none/><empty></empty><text>a &amp; b</text></prog>";
        assert_eq!(
            parse(content, "c.xml").unwrap(),
            json!({"prog": {"none": null, "empty": null, "text": "a & b"}})
        );
    }

    #[test]
    fn test_structural_errors() {
        assert!(parse("just words", "c.xml").is_err());
        assert!(parse("<a></a><b></b>", "c.xml").is_err());
        assert!(parse("<a><b></a>", "c.xml").is_err());
    }
}
