//! Accessor paths (`people[0].name`, `table:rows.total`)
//!
//! An accessor is the body of a `${...}` placeholder. Segments are separated
//! by `.` or written in brackets, either as a bare index (`[2]`) or as a
//! quoted key (`["first name"]`, `['x.y']`). Bodies that do not follow this
//! grammar are kept as one opaque key, so they simply fail to resolve.

use std::fmt;

/// Prefix marking an accessor as a table-row driver
pub const TABLE_QUALIFIER: &str = "table:";

/// One step of an accessor path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Segment {
    /// Field lookup in a mapping
    Key(String),
    /// 0-based position in a sequence
    Index(usize),
}

impl Segment {
    fn from_bare(text: String) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            match text.parse() {
                Ok(index) => Segment::Index(index),
                Err(_) => Segment::Key(text),
            }
        } else {
            Segment::Key(text)
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A parsed placeholder body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accessor {
    table: bool,
    segments: Vec<Segment>,
}

impl Accessor {
    /// Parse a placeholder body such as `table:people[0]["name"]`.
    ///
    /// Never fails: malformed paths become a single opaque key holding the
    /// whole path text.
    ///
    /// ```
    /// use stencil_sheets_core::accessor::{Accessor, Segment};
    ///
    /// let accessor = Accessor::parse("table:people[1].name");
    /// assert!(accessor.is_table());
    /// assert_eq!(
    ///     accessor.segments(),
    ///     &[
    ///         Segment::Key("people".into()),
    ///         Segment::Index(1),
    ///         Segment::Key("name".into()),
    ///     ]
    /// );
    /// ```
    pub fn parse(body: &str) -> Self {
        let body = body.trim();
        let (table, path) = match body.strip_prefix(TABLE_QUALIFIER) {
            Some(rest) => (true, rest.trim()),
            None => (false, body),
        };

        let segments =
            tokenize(path).unwrap_or_else(|| vec![Segment::Key(path.to_string())]);

        Self { table, segments }
    }

    /// Whether the body carried the `table:` qualifier
    pub fn is_table(&self) -> bool {
        self.table
    }

    /// Path segments, in lookup order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Split a path into segments. `None` means the path is malformed.
fn tokenize(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    // Whether the last thing consumed was a closing bracket, which may be
    // followed directly by `.` or `[` without a bare name in between.
    let mut after_bracket = false;
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() && !after_bracket {
                    return None;
                }
                if !current.is_empty() {
                    segments.push(Segment::from_bare(std::mem::take(&mut current)));
                }
                after_bracket = false;
                // A trailing dot leaves nothing to name.
                if chars.peek().is_none() {
                    return None;
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(Segment::from_bare(std::mem::take(&mut current)));
                } else if !segments.is_empty() && !after_bracket {
                    // `a.[0]`
                    return None;
                }
                segments.push(bracket_segment(&mut chars)?);
                after_bracket = true;
            }
            ']' => return None,
            _ => {
                if after_bracket {
                    // `a[0]b`
                    return None;
                }
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        segments.push(Segment::from_bare(current));
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Read the inside of `[...]`; the opening bracket is already consumed.
fn bracket_segment<I>(chars: &mut std::iter::Peekable<I>) -> Option<Segment>
where
    I: Iterator<Item = char>,
{
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let segment = match chars.peek().copied() {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next()? {
                    '\\' => key.push(chars.next()?),
                    c if c == quote => break,
                    c => key.push(c),
                }
            }
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            Segment::Key(key)
        }
        _ => {
            let mut bare = String::new();
            loop {
                match chars.peek().copied()? {
                    ']' => break,
                    '[' | '"' | '\'' => return None,
                    c => {
                        bare.push(c);
                        chars.next();
                    }
                }
            }
            let bare = bare.trim().to_string();
            if bare.is_empty() {
                return None;
            }
            Segment::from_bare(bare)
        }
    };

    match chars.next() {
        Some(']') => Some(segment),
        _ => None,
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table {
            f.write_str(TABLE_QUALIFIER)?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i > 0 => write!(f, ".{key}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}
