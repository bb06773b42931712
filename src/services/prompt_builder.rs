//! Prompt Builder
//!
//! Shared building blocks for the interview and article prompts. Each prompt
//! is a list of segments handed to the text generator in order.

/// Build the leading system segment: role, response language, task.
pub fn build_system_prompt(role: &str, task: &str, locale: &str) -> String {
    let parts = [
        role.to_string(),
        format!(
            "\n## Response Language\n{}",
            locale_response_instruction(locale)
        ),
        format!("\n## Your Task\n{}", task),
    ];
    parts.join("\n")
}

/// Response language line for a locale code (e.g., "en", "ja", "zh-CN").
pub fn locale_response_instruction(locale: &str) -> &'static str {
    let normalized = locale.trim().to_lowercase();
    if normalized.starts_with("zh") {
        "Respond in Simplified Chinese. Keep proper nouns, names, and quoted material in original form."
    } else if normalized.starts_with("ja") {
        "Respond in Japanese. Keep proper nouns, names, and quoted material in original form."
    } else {
        "Respond in English. Keep proper nouns, names, and quoted material in original form."
    }
}

/// Output contract for prompts whose response is parsed as JSON.
pub fn json_output_instruction(schema: &str) -> String {
    format!(
        "## Output Format\n\
         Respond with ONLY a JSON object matching this schema. \
         No markdown fences, no commentary.\n\n{}",
        schema
    )
}

/// Segment carrying assembled reference knowledge, if there is any.
pub fn knowledge_segment(context: &str) -> Option<String> {
    if context.trim().is_empty() {
        None
    } else {
        Some(context.to_string())
    }
}

/// `1. item` lines.
pub fn numbered_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref().trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `- item` lines.
pub fn bullet_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref().trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
