//! Conversation Messages
//!
//! The interview transcript is an append-only, ordered sequence of messages.
//! Messages are never mutated after they are appended.

use serde::{Deserialize, Serialize};

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Interviewer,
    Interviewee,
}

impl MessageRole {
    /// Label used when rendering a transcript into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interviewer => "Interviewer",
            Self::Interviewee => "Interviewee",
        }
    }
}

/// One message of an interview transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    /// Position of the message within its session (0-based).
    pub sequence: u32,
}

impl ConversationMessage {
    /// Create an interviewer (question) message
    pub fn interviewer(sequence: u32, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Interviewer,
            content: content.into(),
            sequence,
        }
    }

    /// Create an interviewee (answer) message
    pub fn interviewee(sequence: u32, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Interviewee,
            content: content.into(),
            sequence,
        }
    }
}

/// All questions the interviewer has asked, in transcript order.
pub fn questions(history: &[ConversationMessage]) -> Vec<&str> {
    history
        .iter()
        .filter(|m| m.role == MessageRole::Interviewer)
        .map(|m| m.content.as_str())
        .collect()
}

/// Number of answers the interviewee has given so far.
pub fn interviewee_turns(history: &[ConversationMessage]) -> usize {
    history
        .iter()
        .filter(|m| m.role == MessageRole::Interviewee && !m.content.trim().is_empty())
        .count()
}

/// Render a transcript as `Role: content` lines, ordered by sequence.
pub fn render_transcript(history: &[ConversationMessage]) -> String {
    let mut ordered: Vec<&ConversationMessage> = history.iter().collect();
    ordered.sort_by_key(|m| m.sequence);
    ordered
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
