//! Request types for the HTTP surface

use serde::{Deserialize, Serialize};

use crate::question::QuestionContent;

/// `POST /questions` body
///
/// Fields are optional so that a missing `text` is reported as a validation
/// error by the handler rather than as a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl CreateQuestionRequest {
    /// Convert into question content (text may still be blank)
    pub fn into_content(self) -> QuestionContent {
        QuestionContent {
            text: self.text.unwrap_or_default(),
            options: self.options.unwrap_or_default(),
            correct_answer: self.correct_answer,
        }
    }
}

impl From<QuestionContent> for CreateQuestionRequest {
    fn from(content: QuestionContent) -> Self {
        Self {
            text: Some(content.text),
            options: Some(content.options),
            correct_answer: content.correct_answer,
        }
    }
}

/// `GET /reconcile` query
///
/// `last_seq` is kept as raw text so the handler can reject non-integers
/// with a precise message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileQuery {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub last_seq: Option<String>,
}

impl ReconcileQuery {
    pub fn new(client_id: impl Into<String>, last_seq: u64) -> Self {
        Self {
            client_id: Some(client_id.into()),
            last_seq: Some(last_seq.to_string()),
        }
    }
}
