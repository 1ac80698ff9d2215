//! Sequenced question - the unit of delivered content

use serde::{Deserialize, Serialize};

/// Question content as submitted by the author
///
/// The delivery core never interprets these fields; they travel as an
/// immutable blob alongside the sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContent {
    /// Question text (required, non-blank)
    pub text: String,
    /// Answer options
    #[serde(default)]
    pub options: Vec<String>,
    /// Marker of the correct option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl QuestionContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
            correct_answer: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }
}

/// Question - immutable, globally sequenced record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Global sequence number (dense, starts at 1)
    /// This is the AUTHORITATIVE ordering and dedup key
    pub seq: u64,
    #[serde(flatten)]
    pub content: QuestionContent,
    /// Server timestamp (Unix milliseconds), informational only
    pub created_at: i64,
}

impl Question {
    pub fn new(seq: u64, content: QuestionContent, created_at: i64) -> Self {
        Self {
            seq,
            content,
            created_at,
        }
    }

    pub fn text(&self) -> &str {
        &self.content.text
    }
}
