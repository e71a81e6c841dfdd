//! Counseling session records

use crate::dialogue::{Dialogue, TurnPolicy};
use crate::feedback::{MitiFeedback, EXPECTED_CRITERIA};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of the session that always exists
pub const DEFAULT_SESSION: &str = "Intros";

/// What the simulated client came in about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CounselingCategory {
    Academic,
    Interpersonal,
    #[default]
    Emotional,
    SchoolLife,
}

impl CounselingCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CounselingCategory::Academic => "academic",
            CounselingCategory::Interpersonal => "interpersonal",
            CounselingCategory::Emotional => "emotional",
            CounselingCategory::SchoolLife => "school_life",
        }
    }
}

impl fmt::Display for CounselingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown counseling category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for CounselingCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "academic" => Ok(CounselingCategory::Academic),
            "interpersonal" => Ok(CounselingCategory::Interpersonal),
            "emotional" => Ok(CounselingCategory::Emotional),
            "school_life" => Ok(CounselingCategory::SchoolLife),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// A named practice session with its dialogue and evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounselingSession {
    pub id: String,
    pub chat_name: String,
    pub category: CounselingCategory,
    /// The concern the simulated client is seeded with
    pub seed_concern: String,
    pub dialogue: Dialogue,
    pub feedback: MitiFeedback,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CounselingSession {
    pub fn new(
        chat_name: impl Into<String>,
        category: CounselingCategory,
        seed_concern: impl Into<String>,
        policy: TurnPolicy,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_name: chat_name.into(),
            category,
            seed_concern: seed_concern.into(),
            dialogue: Dialogue::with_policy(policy),
            feedback: MitiFeedback::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the dialogue is over and all criteria have been scored
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.dialogue.is_completed() && self.feedback.len() == EXPECTED_CRITERIA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::Role;
    use crate::feedback::MITI_GLOBAL_CRITERIA;

    #[test]
    fn test_category_parse_and_display() {
        for category in [
            CounselingCategory::Academic,
            CounselingCategory::Interpersonal,
            CounselingCategory::Emotional,
            CounselingCategory::SchoolLife,
        ] {
            assert_eq!(category.as_str().parse::<CounselingCategory>(), Ok(category));
        }
        assert_eq!(
            "career".parse::<CounselingCategory>(),
            Err(UnknownCategory("career".to_string()))
        );
        assert_eq!(CounselingCategory::SchoolLife.to_string(), "school_life");
    }

    #[test]
    fn test_session_is_evaluated_after_dialogue_and_feedback() {
        let mut session = CounselingSession::new(
            "exam stress",
            CounselingCategory::Academic,
            "Worried about failing finals",
            TurnPolicy::with_max_turns(1),
        );
        assert!(!session.is_evaluated());

        while !session.dialogue.is_completed() {
            session.dialogue.append(Role::User, "reflection", "...").unwrap();
        }
        assert!(!session.is_evaluated());

        for name in MITI_GLOBAL_CRITERIA {
            session.feedback.store(name, 3, "solid");
        }
        assert!(session.is_evaluated());
    }

    #[test]
    fn test_is_evaluated_counts_entries_with_duplicate_criteria() {
        let mut session = CounselingSession::new(
            "roommate",
            CounselingCategory::Interpersonal,
            "Constant arguments",
            TurnPolicy::with_max_turns(1),
        );
        while !session.dialogue.is_completed() {
            session.dialogue.append(Role::AiClient, "client", "...").unwrap();
        }

        session.feedback.store("Empathy", 2, "first pass");
        session.feedback.store("Empathy", 4, "second pass");
        session.feedback.store("Partnership", 3, "ok");
        assert!(!session.is_evaluated());

        session.feedback.store("Cultivating Change Talk", 3, "ok");
        assert!(session.is_evaluated());
        assert_eq!(session.feedback.len(), 4);
    }
}
