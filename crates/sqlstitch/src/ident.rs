//! Validated SQL identifiers.
//!
//! [`Ident`] is the gate every raw column, table or alias string passes
//! through before it reaches SQL text. Dotted paths are supported
//! (`schema.table.column`), segments are either bare
//! (`[A-Za-z_][A-Za-z0-9_$]*`) or double-quoted (inner `"` written as `""`).

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{StitchError, StitchResult};

/// One dotted-path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    text: String,
    quoted: bool,
}

/// A validated SQL identifier path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    segments: Vec<Segment>,
}

impl Ident {
    /// Parse a dotted identifier path, rejecting anything that could not be
    /// a plain identifier (whitespace, operators, stray quotes).
    pub fn parse(raw: &str) -> StitchResult<Self> {
        if raw.is_empty() {
            return Err(StitchError::identifier("empty identifier"));
        }
        if raw.contains('\0') {
            return Err(StitchError::identifier("identifier contains NUL"));
        }

        let mut chars = raw.chars().peekable();
        let mut segments = Vec::new();
        loop {
            let segment = if chars.peek() == Some(&'"') {
                read_quoted(&mut chars)?
            } else {
                read_bare(&mut chars)?
            };
            segments.push(segment);

            match chars.next() {
                None => break,
                Some('.') => {
                    if chars.peek().is_none() {
                        return Err(StitchError::identifier(format!(
                            "trailing '.' in '{raw}'"
                        )));
                    }
                }
                Some(c) => {
                    return Err(StitchError::identifier(format!(
                        "unexpected '{c}' in '{raw}'"
                    )));
                }
            }
        }

        Ok(Self { segments })
    }

    /// Build a single quoted segment without parsing.
    pub fn quoted(name: &str) -> StitchResult<Self> {
        if name.is_empty() {
            return Err(StitchError::identifier("empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(StitchError::identifier("identifier contains NUL"));
        }
        Ok(Self {
            segments: vec![Segment {
                text: name.to_string(),
                quoted: true,
            }],
        })
    }

    /// True for a single-segment path (a bare column, no schema/alias prefix).
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    /// Render as SQL text.
    pub fn sql(&self) -> String {
        let mut out = String::new();
        self.push_sql(&mut out);
        out
    }

    /// Render as SQL text, prefixing `alias.` when this is a simple
    /// identifier and an alias is in effect. Already-qualified paths are
    /// left alone.
    pub fn qualified(&self, alias: Option<&str>) -> String {
        match alias {
            Some(a) if self.is_simple() => {
                let mut out = String::with_capacity(a.len() + 1 + self.segments[0].text.len());
                out.push_str(a);
                out.push('.');
                self.push_sql(&mut out);
                out
            }
            _ => self.sql(),
        }
    }

    pub(crate) fn push_sql(&self, out: &mut String) {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if segment.quoted {
                out.push('"');
                for ch in segment.text.chars() {
                    if ch == '"' {
                        out.push_str("\"\"");
                    } else {
                        out.push(ch);
                    }
                }
                out.push('"');
            } else {
                out.push_str(&segment.text);
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> StitchResult<Segment> {
    chars.next(); // opening quote
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('"') if chars.peek() == Some(&'"') => {
                chars.next();
                text.push('"');
            }
            Some('"') => break,
            Some(c) => text.push(c),
            None => return Err(StitchError::identifier("unterminated quoted identifier")),
        }
    }
    if text.is_empty() {
        return Err(StitchError::identifier("empty quoted identifier"));
    }
    Ok(Segment { text, quoted: true })
}

fn read_bare(chars: &mut Peekable<Chars<'_>>) -> StitchResult<Segment> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' {
            break;
        }
        let ok = if text.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !ok {
            if text.is_empty() {
                return Err(StitchError::identifier(format!(
                    "identifier segment cannot start with '{c}'"
                )));
            }
            break;
        }
        text.push(c);
        chars.next();
    }
    if text.is_empty() {
        return Err(StitchError::identifier("empty identifier segment"));
    }
    Ok(Segment {
        text,
        quoted: false,
    })
}
