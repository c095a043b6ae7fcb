//! Canonicalization applied to answers before comparison.
//!
//! Both the submitted answer and the ground truth pass through the same
//! rules, so comparison is a plain equality check on the normalized values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-field normalization rules, fixed by the archetype at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationRules {
    /// Collapse runs of whitespace to a single space and trim the ends.
    pub collapse_whitespace: bool,
    /// Fold lookalike codepoints the generators emit (NBSP, curly quotes,
    /// en/em dashes, zero-width characters) to their ASCII counterparts.
    pub fold_unicode: bool,
    /// Compare strings case-insensitively.
    pub case_insensitive: bool,
    /// Treat sequences as unordered: both sides are sorted before
    /// comparison.
    pub sort_lists: bool,
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            fold_unicode: true,
            case_insensitive: false,
            sort_lists: false,
        }
    }
}

impl NormalizationRules {
    /// Rules for order-insensitive sequence comparison.
    pub fn unordered() -> Self {
        Self {
            sort_lists: true,
            ..Self::default()
        }
    }

    /// Applies the rules recursively to a JSON value.
    ///
    /// Strings are canonicalized; lists are normalized element-wise and
    /// optionally sorted; map keys are normalized with the scalar rules so
    /// that `" Weight "` and `"weight"` compare equal when the rules say
    /// they should.
    pub fn apply(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.normalize_str(s)),
            Value::Array(items) => {
                let mut normalized: Vec<Value> = items.iter().map(|v| self.apply(v)).collect();
                if self.sort_lists {
                    normalized.sort_by(|a, b| {
                        serde_json::to_string(a)
                            .unwrap_or_default()
                            .cmp(&serde_json::to_string(b).unwrap_or_default())
                    });
                }
                Value::Array(normalized)
            }
            Value::Object(map) => {
                let mut normalized = serde_json::Map::new();
                for (key, item) in map {
                    normalized.insert(self.normalize_str(key), self.apply(item));
                }
                Value::Object(normalized)
            }
            other => other.clone(),
        }
    }

    /// Canonicalizes a single string according to the rules.
    pub fn normalize_str(&self, s: &str) -> String {
        let mut out = if self.fold_unicode {
            fold_unicode(s)
        } else {
            s.to_string()
        };
        if self.collapse_whitespace {
            out = out.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        if self.case_insensitive {
            out = out.to_lowercase();
        }
        out
    }
}

/// Folds the fixed set of lookalike codepoints the generators are allowed
/// to emit. This is deliberately a closed table rather than full Unicode
/// normalization: the generator controls the artifact, so the table is
/// exhaustive for everything that can reach an answer.
fn fold_unicode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            // Space variants.
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{2009}' => out.push(' '),
            // Zero-width characters vanish.
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => {}
            // Quotes.
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            // Dashes.
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            other => out.push(other),
        }
    }
    out
}
