//! JSON with comments
//!
//! `#` and `//` line comments and `/* */` block comments are blanked out
//! before decoding. Line breaks are kept so decoder positions still point at
//! the original text.

use serde_json::Value as Raw;

use super::line_col;
use crate::error::{ConfigError, ConfigResult};

pub(super) fn parse(content: &str, source_id: &str) -> ConfigResult<Raw> {
    let stripped = strip_comments(content).map_err(|offset| {
        ConfigError::malformed_at(
            source_id,
            Some(line_col(content, offset)),
            "unterminated block comment",
        )
    })?;
    serde_json::from_str(&stripped).map_err(|err| {
        ConfigError::malformed_at(
            source_id,
            Some(format!("{}:{}", err.line(), err.column())),
            err.to_string(),
        )
    })
}

/// Replace comments outside string literals with whitespace.
///
/// Returns the byte offset of an unterminated block comment on failure.
pub(crate) fn strip_comments(content: &str) -> Result<String, usize> {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();
    let mut in_string = false;

    while let Some((offset, c)) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '#' => blank_line(&mut chars, &mut out, c),
            '/' if matches!(chars.peek(), Some((_, '/'))) => blank_line(&mut chars, &mut out, c),
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                out.push_str("  ");
                let mut closed = false;
                while let Some((_, inner)) = chars.next() {
                    if inner == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        out.push_str("  ");
                        closed = true;
                        break;
                    }
                    blank(&mut out, inner);
                }
                if !closed {
                    return Err(offset);
                }
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn blank_line<I>(chars: &mut std::iter::Peekable<I>, out: &mut String, first: char)
where
    I: Iterator<Item = (usize, char)>,
{
    blank(out, first);
    while let Some((_, c)) = chars.peek() {
        if *c == '\n' {
            break;
        }
        let c = *c;
        chars.next();
        blank(out, c);
    }
}

fn blank(out: &mut String, c: char) {
    if c == '\n' || c == '\r' {
        out.push(c);
    } else {
        out.push(' ');
    }
}
