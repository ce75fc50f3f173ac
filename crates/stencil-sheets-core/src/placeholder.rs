//! Discovery of `${...}` placeholders inside cell text

/// Marker opening a placeholder
pub const OPEN: &str = "${";

/// A placeholder found in a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte offset of the `$`
    pub start: usize,
    /// Byte offset just past the closing `}`
    pub end: usize,
    /// Text between `${` and `}`
    pub body: &'a str,
}

/// Find every placeholder in `text`, left to right.
///
/// The closing brace is the first `}` that is not inside a quoted bracket
/// key, so `${a["}"]}` is one placeholder. An opening `${` without a closing
/// brace is plain text.
pub fn find_placeholders(text: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(OPEN) {
        let start = search_from + offset;
        let body_start = start + OPEN.len();
        match closing_brace(&text[body_start..]) {
            Some(len) => {
                let end = body_start + len + 1;
                found.push(Placeholder {
                    start,
                    end,
                    body: &text[body_start..body_start + len],
                });
                search_from = end;
            }
            None => break,
        }
    }

    found
}

/// Position of the closing `}` relative to `rest`.
fn closing_brace(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut in_bracket = false;
    let mut escaped = false;

    for (i, c) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '[' => in_bracket = true,
            ']' => in_bracket = false,
            '"' | '\'' if in_bracket => quote = Some(c),
            '}' => return Some(i),
            _ => {}
        }
    }

    None
}

/// If `text` is exactly one placeholder and nothing else, return its body.
pub fn sole_placeholder(text: &str) -> Option<&str> {
    match find_placeholders(text).as_slice() {
        [only] if only.start == 0 && only.end == text.len() => Some(only.body),
        _ => None,
    }
}

/// Whether `text` contains at least one placeholder
pub fn contains_placeholder(text: &str) -> bool {
    !find_placeholders(text).is_empty()
}

/// Replace every placeholder with the text `replace` returns for its body.
pub fn substitute<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for placeholder in find_placeholders(text) {
        out.push_str(&text[last..placeholder.start]);
        out.push_str(&replace(placeholder.body));
        last = placeholder.end;
    }

    out.push_str(&text[last..]);
    out
}
