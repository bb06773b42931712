//! Near-JSON Repair
//!
//! Text-level helpers for the recovery pipeline: candidate extraction
//! (fenced block, brace span) and the two repair passes (string escaping with
//! unterminated-string closure, then bracket closure). Every function is
//! total over arbitrary input.

/// Interior of the first fenced block (```` ```lang ... ``` ````).
///
/// An unterminated fence yields everything after the opening line.
pub fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];

    // Optional language tag
    let tag_len = after_fence
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map(|(i, _)| i)
        .unwrap_or(after_fence.len());
    let body = &after_fence[tag_len..];

    let interior = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let interior = interior.trim();
    if interior.is_empty() {
        None
    } else {
        Some(interior)
    }
}

/// Substring from the first `{` through the last `}`.
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Text the repair passes operate on: from the first `{` to the bracket that
/// balances it, or to the end of text when nothing does (truncated output).
///
/// Brackets inside string literals are ignored, so a `}` inside an
/// unterminated string does not end the candidate early.
pub fn repair_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let rest = &text[start..];

    let mut depth = 0usize;
    let mut inside_string = false;
    let mut escape_next = false;
    for (i, c) in rest.char_indices() {
        if inside_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                inside_string = false;
            }
            continue;
        }
        match c {
            '"' => inside_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&rest[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    Some(rest)
}

/// Outcome of the string-escaping pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRepair {
    pub text: String,
    /// The scan ended inside a string literal and a closing quote was added.
    pub closed_unterminated: bool,
}

/// Escape raw control characters inside string literals and close a string
/// left open at end of text.
///
/// Inside a literal: raw LF becomes `\n`, CR and CRLF become `\n` (a CRLF pair
/// is one unit), tab becomes `\t`, other control characters become `\u00XX`.
/// Outside literals everything passes through. A `"` toggles the literal
/// unless it is escaped.
///
/// When the text ends inside a literal, the closing quote is placed before
/// any trailing run of `}`, `]` and whitespace, so those closers keep their
/// structural meaning.
pub fn escape_string_literals(text: &str) -> StringRepair {
    let mut out = String::with_capacity(text.len() + 8);
    let mut inside_string = false;
    let mut escape_next = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if !inside_string {
            if c == '"' {
                inside_string = true;
            }
            out.push(c);
            continue;
        }

        if escape_next {
            escape_next = false;
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push('n');
                }
                '\n' => out.push('n'),
                '\t' => out.push('t'),
                c if (c as u32) < 0x20 => out.push_str(&format!("u{:04x}", c as u32)),
                c => out.push(c),
            }
            continue;
        }

        match c {
            '\\' => {
                escape_next = true;
                out.push(c);
            }
            '"' => {
                inside_string = false;
                out.push(c);
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    if !inside_string {
        return StringRepair {
            text: out,
            closed_unterminated: false,
        };
    }

    // A dangling backslash would escape the closing quote
    if escape_next {
        out.pop();
    }

    let body_end = out
        .trim_end_matches(|c: char| c == '}' || c == ']' || c.is_whitespace())
        .len();
    // Never step back over the opening quote itself
    let insert_at = if out[..body_end].ends_with('"') && !out[..body_end].ends_with("\\\"") {
        out.len()
    } else {
        body_end
    };
    out.insert(insert_at, '"');

    StringRepair {
        text: out,
        closed_unterminated: true,
    }
}

/// Append the closers needed to balance `{`/`[` outside string literals, in
/// LIFO order.
///
/// Before closing, a trailing comma is dropped and a trailing `:` gets a
/// `null` value so the truncated member still parses. Stray closers that do
/// not match the open bracket are left in place.
pub fn close_brackets(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut inside_string = false;
    let mut escape_next = false;

    for c in text.chars() {
        if inside_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                inside_string = false;
            }
            continue;
        }
        match c {
            '"' => inside_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut out = text.trim_end().to_string();
    if stack.is_empty() {
        return out;
    }

    if out.ends_with(',') {
        out.pop();
    } else if out.ends_with(':') {
        out.push_str(" null");
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}
