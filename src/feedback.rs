//! MITI feedback accumulation
//!
//! A session is scored on four global criteria. Scores arrive one at a time
//! and can only be summarized once all four are in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Number of criteria a complete evaluation carries
pub const EXPECTED_CRITERIA: usize = 4;

/// The MITI 4 global scores, in the order evaluators usually report them
pub const MITI_GLOBAL_CRITERIA: [&str; EXPECTED_CRITERIA] = [
    "Cultivating Change Talk",
    "Softening Sustain Talk",
    "Partnership",
    "Empathy",
];

/// A single scored criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub criterion: String,
    pub score: i32,
    pub rationale: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Expected exactly {expected} feedback entries, got {actual}")]
    Incomplete { expected: usize, actual: usize },
}

/// Ordered collection of criterion scores for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitiFeedback {
    entries: Vec<Criterion>,
}

impl MitiFeedback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score. Repeated criterion names are kept.
    pub fn store(&mut self, criterion: impl Into<String>, score: i32, rationale: impl Into<String>) {
        self.entries.push(Criterion {
            criterion: criterion.into(),
            score,
            rationale: rationale.into(),
        });
    }

    /// Map each criterion name to its entry
    ///
    /// When a name was stored twice the later entry wins.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError::Incomplete`] unless exactly
    /// [`EXPECTED_CRITERIA`] entries have been stored.
    pub fn summarize(&self) -> Result<BTreeMap<String, Criterion>, FeedbackError> {
        if self.entries.len() != EXPECTED_CRITERIA {
            return Err(FeedbackError::Incomplete {
                expected: EXPECTED_CRITERIA,
                actual: self.entries.len(),
            });
        }

        let mut summary = BTreeMap::new();
        for entry in &self.entries {
            if let Some(replaced) = summary.insert(entry.criterion.clone(), entry.clone()) {
                tracing::warn!(
                    criterion = %replaced.criterion,
                    dropped_score = replaced.score,
                    "Duplicate feedback criterion, keeping the later entry"
                );
            }
        }
        Ok(summary)
    }

    /// Sum of all stored scores
    #[must_use]
    pub fn total_score(&self) -> i64 {
        self.entries.iter().map(|e| i64::from(e.score)).sum()
    }

    #[must_use]
    pub fn entries(&self) -> &[Criterion] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
