//! The dialogue phase tracker
//!
//! Appending an utterance counts a turn against the active phase. When the
//! phase reaches `max_turns_per_phase` the dialogue advances; advancing past
//! `Terminating` completes it, after which nothing more can be appended.

use super::{Phase, PhaseState, Role, Utterance};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Turns after which a phase closes on its own
pub const MAX_TURNS_PER_PHASE: u32 = 5;

/// Lower bound a phase controller should respect before closing a phase early
pub const MIN_TURNS_PER_PHASE: u32 = 2;

/// Turn thresholds, shared by every phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPolicy {
    pub min_turns_per_phase: u32,
    pub max_turns_per_phase: u32,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self {
            min_turns_per_phase: MIN_TURNS_PER_PHASE,
            max_turns_per_phase: MAX_TURNS_PER_PHASE,
        }
    }
}

impl TurnPolicy {
    /// Policy with a custom closing threshold and the default minimum
    #[must_use]
    pub fn with_max_turns(max_turns_per_phase: u32) -> Self {
        Self {
            max_turns_per_phase,
            ..Self::default()
        }
    }
}

/// Errors from mutating a dialogue
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("Cannot add utterance to completed dialogue")]
    Completed,
}

/// A counseling dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    policy: TurnPolicy,
    state: PhaseState,
    turn_count_per_phase: [u32; Phase::COUNT],
    entries: Vec<Utterance>,
}

impl Default for Dialogue {
    fn default() -> Self {
        Self::with_policy(TurnPolicy::default())
    }
}

impl Dialogue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: TurnPolicy) -> Self {
        Self {
            policy,
            state: PhaseState::default(),
            turn_count_per_phase: [0; Phase::COUNT],
            entries: Vec::new(),
        }
    }

    /// Record an utterance in the active phase
    ///
    /// Closes the phase when its turn count reaches the policy maximum.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueError::Completed`] once every phase has closed. The
    /// dialogue is left untouched in that case.
    pub fn append(
        &mut self,
        role: Role,
        subtype: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<&Utterance, DialogueError> {
        let PhaseState::Active(phase) = self.state else {
            return Err(DialogueError::Completed);
        };

        self.entries.push(Utterance::new(role, subtype, text, phase));

        let count = &mut self.turn_count_per_phase[phase.index()];
        *count += 1;
        if *count >= self.policy.max_turns_per_phase {
            self.advance();
        }

        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Close the active phase and move to the next one
    ///
    /// Advancing out of `Terminating` completes the dialogue. No-op once
    /// completed.
    pub fn advance(&mut self) {
        let previous = self.state;
        self.state = previous.advanced();

        match self.state {
            PhaseState::Active(phase) => {
                tracing::debug!(from = ?previous.active_phase(), to = %phase, "Dialogue phase advanced");
            }
            PhaseState::Completed if previous != PhaseState::Completed => {
                tracing::info!(entries = self.entries.len(), "Dialogue completed");
            }
            PhaseState::Completed => {}
        }
    }

    /// Whether the active phase has collected the policy minimum of turns
    ///
    /// A phase controller checks this before calling [`Dialogue::advance`]
    /// early. Always false once completed.
    #[must_use]
    pub fn meets_minimum_turns(&self) -> bool {
        self.state
            .active_phase()
            .is_some_and(|phase| self.turn_count(phase) >= self.policy.min_turns_per_phase)
    }

    #[must_use]
    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// The active phase, or the last phase once completed
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.state.active_phase().unwrap_or(Phase::Terminating)
    }

    /// Index of the active phase; one past the last phase once completed
    #[must_use]
    pub fn phase_index(&self) -> usize {
        self.state.index()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.is_terminal()
    }

    #[must_use]
    pub fn turn_count(&self, phase: Phase) -> u32 {
        self.turn_count_per_phase[phase.index()]
    }

    #[must_use]
    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }

    #[must_use]
    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    /// The exchange between the user and the simulated client
    ///
    /// Assistant suggestions and phase controller reasoning are left out.
    pub fn user_conversation(&self) -> impl Iterator<Item = &Utterance> + '_ {
        self.entries.iter().filter(|entry| entry.role.is_user_visible())
    }
}
