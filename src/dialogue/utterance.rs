//! Utterance log entries

use super::Phase;
use serde::{Deserialize, Serialize};

/// Who produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The counselor-in-training typing into the chat
    User,
    /// The simulated client
    AiClient,
    /// Suggests alternative phrasings for the user
    UtteranceAssistant,
    /// Reasons about phase transitions
    PhaseController,
}

impl Role {
    /// Whether this role takes part in the conversation the user sees
    #[must_use]
    pub fn is_user_visible(self) -> bool {
        matches!(self, Role::User | Role::AiClient)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::AiClient => "ai_client",
            Role::UtteranceAssistant => "utterance_assistant",
            Role::PhaseController => "phase_controller",
        }
    }
}

/// One recorded turn
///
/// For `User` entries `subtype` is the utterance type the user picked
/// (restatement, clarification, ...). For agent roles it is a free-form label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub role: Role,
    #[serde(rename = "type")]
    pub subtype: String,
    #[serde(rename = "utterance")]
    pub text: String,
    pub phase: Phase,
}

impl Utterance {
    pub fn new(role: Role, subtype: impl Into<String>, text: impl Into<String>, phase: Phase) -> Self {
        Self {
            role,
            subtype: subtype.into(),
            text: text.into(),
            phase,
        }
    }
}
