//! Final-answer validation.
//!
//! Parsing and schema checking are separate gates with separate metrics,
//! so training diagnostics can tell formatting failures from reasoning
//! failures. Normalization happens here too: the reward engine only ever
//! compares already-normalized values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{AnswerStatus, FinalAnswer, TaskInstance};

/// Result of validating one raw answer against a task's contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// The raw emission parsed as structured data.
    pub format_ok: bool,
    /// The parsed data satisfies the answer contract (and, for `ok`, the
    /// task's answer schema).
    pub schema_ok: bool,
    /// The parsed answer, when the shape was recognizable.
    pub final_answer: Option<FinalAnswer>,
    /// The `ok` answer after normalization, ready for comparison.
    pub normalized_answer: Option<Value>,
    /// Description of the first failure, for diagnostics.
    pub error: Option<String>,
}

impl ValidationOutcome {
    fn format_failure(error: String) -> Self {
        Self {
            format_ok: false,
            schema_ok: false,
            final_answer: None,
            normalized_answer: None,
            error: Some(error),
        }
    }

    fn schema_failure(final_answer: Option<FinalAnswer>, error: String) -> Self {
        Self {
            format_ok: true,
            schema_ok: false,
            final_answer,
            normalized_answer: None,
            error: Some(error),
        }
    }
}

/// Validates a raw final answer against the task's contract.
///
/// Gate order matters: a parse failure short-circuits to `format_ok =
/// false`; a well-formed answer with the wrong shape short-circuits to
/// `schema_ok = false`; only a fully conforming `ok` answer gets a
/// normalized value.
pub fn validate(raw_answer: &str, task: &TaskInstance) -> ValidationOutcome {
    let candidate = extract_json(raw_answer);

    let value: Value = match serde_json::from_str(&candidate) {
        Ok(v) => v,
        Err(e) => return ValidationOutcome::format_failure(format!("not well-formed JSON: {}", e)),
    };

    let final_answer: FinalAnswer = match serde_json::from_value(value) {
        Ok(a) => a,
        Err(e) => {
            return ValidationOutcome::schema_failure(
                None,
                format!("does not match the answer contract: {}", e),
            )
        }
    };

    if let Some(violation) = final_answer.contract_violation() {
        return ValidationOutcome::schema_failure(Some(final_answer), violation);
    }

    let normalized_answer = match final_answer.status {
        AnswerStatus::Ok => {
            // Presence is guaranteed by the contract check above.
            let answer = final_answer.answer.as_ref().cloned().unwrap_or(Value::Null);
            if let Err(e) = task.answer_schema.conforms(&answer) {
                return ValidationOutcome::schema_failure(Some(final_answer), e);
            }
            Some(task.normalization_rules.apply(&answer))
        }
        AnswerStatus::Limit => None,
    };

    ValidationOutcome {
        format_ok: true,
        schema_ok: true,
        final_answer: Some(final_answer),
        normalized_answer,
        error: None,
    }
}

/// Extracts the JSON payload from a raw emission.
///
/// Agents reliably wrap JSON in markdown fences or lead-in prose; strip a
/// fence when present, otherwise slice from the first `{` to the last
/// `}`. The result still has to parse; this only locates the payload.
pub fn extract_json(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    {
        if let Some(inner) = rest.rsplit_once("```").map(|(inner, _)| inner) {
            return inner.trim().to_string();
        }
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}
