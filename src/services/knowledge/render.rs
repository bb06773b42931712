//! Context Rendering
//!
//! Formats resolved fragments into prompt sections and composes them under a
//! strict aggregate character budget. All lengths are counted in `char`s so
//! truncation never splits a code point.

use ghostwriter_core::KnowledgeFragment;

/// Heading of the composed knowledge block.
pub const CONTEXT_HEADER: &str = "## Reference Knowledge\n\n\
The following reference material applies to this request:\n\n";

/// Separator placed between fragment sections.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Truncate `text` to at most `max_chars` characters.
///
/// Returns the (possibly shortened) text and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Heading line of one fragment section.
pub fn section_heading(fragment: &KnowledgeFragment) -> String {
    format!("### {} ({})", fragment.id, fragment.owner_scope.label())
}

/// Render one fragment: heading, summary, usage guide, then chunk text.
///
/// `chunk_text` must already be truncated to the per-fragment budget.
pub fn render_fragment_section(fragment: &KnowledgeFragment, chunk_text: &str) -> String {
    let mut parts = Vec::with_capacity(4);
    parts.push(section_heading(fragment));

    let summary = fragment.summary.trim();
    if !summary.is_empty() {
        parts.push(format!("Summary: {}", summary));
    }
    let guide = fragment.usage_guide.trim();
    if !guide.is_empty() {
        parts.push(format!("How to use: {}", guide));
    }
    if !chunk_text.trim().is_empty() {
        parts.push(format!("\n{}", chunk_text.trim_end()));
    }

    parts.join("\n")
}

/// Result of fitting sections into the aggregate budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub rendered: String,
    /// Number of leading sections that made it into `rendered` (the last one
    /// possibly cut short).
    pub included: usize,
}

/// Compose sections in order under `aggregate_budget` characters.
///
/// Sections are appended whole while they fit. The first section that does
/// not fit is cut to the remaining space, provided at least its heading line
/// fits; every section after it is dropped. The rendered string never exceeds
/// the budget.
pub fn compose(sections: &[(String, usize)], aggregate_budget: usize) -> Composition {
    let empty = Composition {
        rendered: String::new(),
        included: 0,
    };
    if sections.is_empty() {
        return empty;
    }

    let header_len = char_len(CONTEXT_HEADER);
    if header_len >= aggregate_budget {
        return empty;
    }

    let mut rendered = String::from(CONTEXT_HEADER);
    let mut used = header_len;
    let mut included = 0;

    for (i, (section, heading_len)) in sections.iter().enumerate() {
        let separator = if i == 0 { "" } else { SECTION_SEPARATOR };
        let piece_len = char_len(separator) + char_len(section);

        if used + piece_len <= aggregate_budget {
            rendered.push_str(separator);
            rendered.push_str(section);
            used += piece_len;
            included += 1;
            continue;
        }

        let remaining = aggregate_budget - used;
        let minimum = char_len(separator) + heading_len;
        if remaining >= minimum {
            let (cut, _) = truncate_chars(section, remaining - char_len(separator));
            rendered.push_str(separator);
            rendered.push_str(&cut);
            included += 1;
        }
        break;
    }

    if included == 0 {
        return empty;
    }
    Composition { rendered, included }
}
