//! Answer Intent Detection
//!
//! Deterministic keyword checks run before the model's judgment. They can
//! only raise signals: an explicit end-of-interview statement sets stop
//! intent, a "skip"/"later" answer completes the item the question targeted.

use std::collections::HashSet;

/// Phrases that end the interview when they appear in an answer.
const STOP_PHRASES: &[&str] = &[
    "that's all",
    "that is all",
    "that's it",
    "that is it",
    "let's end",
    "let us end",
    "end the interview",
    "end this interview",
    "stop the interview",
    "finish the interview",
    "no more questions",
    "i'm done",
    "i am done",
    "we're done",
    "we are done",
    "let's wrap up",
    "wrap it up",
    "nothing more to add",
];

/// Phrases that defer the current item without ending the interview.
const SKIP_PHRASES: &[&str] = &[
    "skip",
    "later",
    "next question",
    "move on",
    "pass",
    "not now",
    "come back to",
    "get back to you",
    "send it over",
    "will send",
    "i'll send",
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "can", "could", "did", "do", "does", "for", "how", "in", "is", "it",
    "of", "on", "or", "the", "to", "was", "what", "when", "where", "which", "who", "why", "will",
    "with", "you", "your",
];

/// Lowercase, fold typographic apostrophes, collapse whitespace.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}', '`'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words of `text` as a padded string so phrase matches respect word
/// boundaries (" skip " does not match "skipper").
fn padded_words(normalized: &str) -> String {
    let words: Vec<&str> = normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", words.join(" "))
}

fn contains_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {} ", phrase))
}

/// Whether the answer explicitly asks to end the interview.
pub fn detect_stop_intent(answer: &str) -> bool {
    let padded = padded_words(&normalize(answer));
    STOP_PHRASES.iter().any(|p| contains_phrase(&padded, p))
}

/// Whether the answer defers the current item ("skip", "later", ...).
///
/// An answer that also carries stop intent is not a skip.
pub fn detect_skip_intent(answer: &str) -> bool {
    if detect_stop_intent(answer) {
        return false;
    }
    let padded = padded_words(&normalize(answer));
    SKIP_PHRASES.iter().any(|p| contains_phrase(&padded, p))
}

fn content_words(text: &str) -> HashSet<String> {
    padded_words(&normalize(text))
        .split_whitespace()
        .map(|w| w.trim_matches('\'').to_string())
        .filter(|w| w.len() > 1 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Index of the objective that shares the most content words with `text`,
/// or `None` when nothing overlaps. Ties go to the earlier objective.
pub fn best_matching_objective(text: &str, objectives: &[String]) -> Option<usize> {
    let words = content_words(text);
    if words.is_empty() {
        return None;
    }

    let mut best: Option<(usize, usize)> = None;
    for (i, objective) in objectives.iter().enumerate() {
        let overlap = content_words(objective).intersection(&words).count();
        if overlap > 0 && best.map_or(true, |(_, b)| overlap > b) {
            best = Some((i, overlap));
        }
    }
    best.map(|(i, _)| i)
}

/// Parse a free-text objective block into one objective per line.
///
/// Bullets and numbering are stripped; blank lines are dropped. Text with no
/// usable line yields an empty list (an open-ended interview).
pub fn parse_objectives(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches(['-', '*', '\u{2022}']).trim_start();
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits > 0 {
                let rest = &line[digits..];
                if let Some(stripped) = rest.strip_prefix(['.', ')']) {
                    return stripped.trim().to_string();
                }
            }
            line.to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}
