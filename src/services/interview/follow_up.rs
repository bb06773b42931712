//! Follow-up Question Generation
//!
//! Produces exactly one question that never repeats an earlier one
//! (compared case- and whitespace-insensitively). A repeated candidate is
//! retried once with an explicit "do not repeat" addendum; after that a
//! generic question that is not in the history is used.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use ghostwriter_core::EvaluationResult;
use ghostwriter_llm::{generate_with_timeout, GenerationOptions, RetryPolicy, TextGenerator};

use crate::models::AppConfig;
use crate::utils::error::{AppError, AppResult};

use super::prompts::{follow_up_prompt, FollowUpFocus};
use super::turn::TurnInput;

/// Deepening prompts used when the generator cannot supply a fresh question.
const GENERIC_QUESTIONS: &[&str] = &[
    "Could you walk me through a specific example of that?",
    "What detail would help readers picture this best?",
    "What was the most memorable moment in all of this?",
    "Who else was involved, and what did they contribute?",
    "Is there anything readers should know that we haven't covered yet?",
];

/// Labels models put in front of the question text.
const QUESTION_LABELS: &[&str] = &[
    "follow-up question:",
    "follow up question:",
    "next question:",
    "question:",
    "q:",
];

pub struct FollowUpGenerator {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    timeout: Duration,
    locale: String,
    retry: RetryPolicy,
    fallback_on_generation_failure: bool,
}

impl FollowUpGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        Self {
            generator,
            options: GenerationOptions::new(
                config.generation.follow_up_temperature,
                config.generation.max_output_tokens,
            ),
            timeout: Duration::from_secs(config.generation.request_timeout_secs),
            locale: config.interview.locale.clone(),
            retry: RetryPolicy::with_max_attempts(config.interview.duplicate_question_max_attempts),
            fallback_on_generation_failure: config.interview.fallback_on_generation_failure,
        }
    }

    /// Generate the next question for an insufficient evaluation.
    pub async fn generate(
        &self,
        input: &TurnInput,
        evaluation: &EvaluationResult,
    ) -> AppResult<String> {
        let asked = input.prior_questions();
        let focus = FollowUpFocus {
            missing_elements: &evaluation.missing_elements,
            suggested_angle: evaluation.suggested_angle.as_deref(),
        };

        let mut avoid: Option<String> = None;
        let mut attempt = 1;
        loop {
            let segments = follow_up_prompt(input, &focus, &self.locale, avoid.as_deref());
            match generate_with_timeout(
                self.generator.as_ref(),
                segments,
                self.options,
                self.timeout,
            )
            .await
            {
                Ok(text) => match extract_question(&text) {
                    Some(question) if !is_duplicate(&question, &asked) => {
                        debug!(attempt, "follow-up question generated");
                        return Ok(question);
                    }
                    Some(question) => {
                        warn!(
                            attempt,
                            max_attempts = self.retry.max_attempts(),
                            question = %question,
                            "follow-up repeated an earlier question"
                        );
                        avoid = Some(question);
                    }
                    None => {
                        warn!(
                            attempt,
                            max_attempts = self.retry.max_attempts(),
                            "follow-up response contained no question"
                        );
                    }
                },
                Err(e) if self.fallback_on_generation_failure => {
                    warn!(error = %e, "follow-up generation failed, using generic question");
                    break;
                }
                Err(e) => return Err(AppError::Generation(e)),
            }

            if !self.retry.allows_retry_after(attempt) {
                break;
            }
            attempt += 1;
        }

        Ok(generic_question(input, &evaluation.missing_elements))
    }
}

/// Pick the question line out of free-form generator output.
///
/// The first non-empty line not starting with `[` wins, after markdown
/// markers, bullets, numbering, labels and wrapping quotes are stripped. A
/// lead-in line ending in `:` is skipped when a real line follows it.
pub fn extract_question(text: &str) -> Option<String> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .map(clean_line)
        .filter(|line| !line.is_empty());

    let first = lines.next()?;
    if !first.ends_with(':') {
        return Some(first);
    }
    lines.find(|line| !line.ends_with(':')).or(Some(first))
}

fn clean_line(line: &str) -> String {
    let mut s = line.trim_start_matches('#').trim_start();
    s = s.trim_start_matches('>').trim_start();
    for bullet in ["- ", "* ", "\u{2022} "] {
        if let Some(rest) = s.strip_prefix(bullet) {
            s = rest.trim_start();
        }
    }
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = s[digits..]
            .strip_prefix(". ")
            .or_else(|| s[digits..].strip_prefix(") "))
        {
            s = rest.trim_start();
        }
    }

    let unemphasized = s.replace("__", "").replace(['*', '`'], "");
    let mut out = unemphasized.trim_matches('_').trim();

    for label in QUESTION_LABELS {
        if out
            .get(..label.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(label))
        {
            out = out[label.len()..].trim_start();
            break;
        }
    }

    strip_wrapping_quotes(out).trim().to_string()
}

fn strip_wrapping_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            return inner;
        }
    }
    s
}

/// Comparison key: lowercase with all whitespace removed.
pub fn normalize_question(question: &str) -> String {
    question
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether `candidate` matches any of `asked`.
pub fn is_duplicate(candidate: &str, asked: &[&str]) -> bool {
    let key = normalize_question(candidate);
    asked.iter().any(|q| normalize_question(q) == key)
}

/// A generic deepening question not present in the history.
///
/// Missing elements are asked about first; the fixed list follows. When
/// every candidate was already asked, a numbered variant of the first one is
/// used.
pub fn generic_question(input: &TurnInput, missing_elements: &[String]) -> String {
    let asked = input.prior_questions();

    let mut candidates: Vec<String> = missing_elements
        .iter()
        .map(|m| m.trim().trim_end_matches(['.', '?']))
        .filter(|m| !m.is_empty())
        .map(|m| format!("Could you tell me more about {}?", m))
        .collect();
    candidates.extend(GENERIC_QUESTIONS.iter().map(|q| q.to_string()));

    if let Some(fresh) = candidates.iter().find(|c| !is_duplicate(c, &asked)) {
        return fresh.clone();
    }

    let base = candidates
        .first()
        .cloned()
        .unwrap_or_else(|| GENERIC_QUESTIONS[0].to_string());
    let mut n = 2;
    loop {
        let variant = format!("{} ({})", base, n);
        if !is_duplicate(&variant, &asked) {
            return variant;
        }
        n += 1;
    }
}
