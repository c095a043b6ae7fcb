//! The final-answer interchange contract.
//!
//! An episode ends with exactly one [`FinalAnswer`]: either an `ok` carrying
//! the extracted value, or a `limit` carrying an abstention reason plus
//! evidence. The shape is a data contract, not a source-language construct;
//! agents emit it as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal status of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    /// The agent claims to have extracted the answer.
    Ok,
    /// The agent abstains, claiming the task cannot be solved statically.
    Limit,
}

/// An abstention claim: why extraction is impossible, and the artifact
/// fragment that proves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitClaim {
    /// Claimed reason, checked against the task's allowed set.
    pub reason: String,
    /// Fragment that must literally occur in the artifact.
    pub evidence: String,
}

/// The one structured answer an episode produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    /// `ok` or `limit`.
    pub status: AnswerStatus,
    /// Extracted value, present iff `status = ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    /// Abstention claim, present iff `status = limit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitClaim>,
}

impl FinalAnswer {
    /// Builds an `ok` answer.
    pub fn ok(answer: Value) -> Self {
        Self {
            status: AnswerStatus::Ok,
            answer: Some(answer),
            limit: None,
        }
    }

    /// Builds a `limit` answer.
    pub fn limit(reason: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            status: AnswerStatus::Limit,
            answer: None,
            limit: Some(LimitClaim {
                reason: reason.into(),
                evidence: evidence.into(),
            }),
        }
    }

    /// Checks the presence rules the contract imposes on top of the field
    /// types: `answer` iff `ok`, `limit` iff `limit`.
    ///
    /// Returns a description of the first violation, if any.
    pub fn contract_violation(&self) -> Option<String> {
        match self.status {
            AnswerStatus::Ok => {
                if self.answer.is_none() {
                    return Some("status is 'ok' but 'answer' is missing".to_string());
                }
                if self.limit.is_some() {
                    return Some("status is 'ok' but 'limit' is present".to_string());
                }
            }
            AnswerStatus::Limit => {
                if self.limit.is_none() {
                    return Some("status is 'limit' but 'limit' is missing".to_string());
                }
                if self.answer.is_some() {
                    return Some("status is 'limit' but 'answer' is present".to_string());
                }
            }
        }
        None
    }
}
