//! Counseling phases and the phase state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four ordered stages of a counseling dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Exploring,
    Choosing,
    Guiding,
    Terminating,
}

impl Phase {
    /// All phases in dialogue order
    pub const ALL: [Phase; 4] = [
        Phase::Exploring,
        Phase::Choosing,
        Phase::Guiding,
        Phase::Terminating,
    ];

    pub const COUNT: usize = Self::ALL.len();

    #[must_use]
    pub fn first() -> Self {
        Phase::Exploring
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Phase::Exploring => 0,
            Phase::Choosing => 1,
            Phase::Guiding => 2,
            Phase::Terminating => 3,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The following phase, or `None` from the last one
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::Exploring => "Exploring",
            Phase::Choosing => "Choosing",
            Phase::Guiding => "Guiding",
            Phase::Terminating => "Terminating",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a dialogue currently sits in its phase sequence
///
/// `Completed` is terminal: there is no transition out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "phase", rename_all = "snake_case")]
pub enum PhaseState {
    Active(Phase),
    Completed,
}

impl Default for PhaseState {
    fn default() -> Self {
        PhaseState::Active(Phase::first())
    }
}

impl PhaseState {
    /// Advance by one phase. The last phase advances into `Completed`.
    #[must_use]
    pub fn advanced(self) -> Self {
        match self {
            PhaseState::Active(phase) => phase.next().map_or(PhaseState::Completed, PhaseState::Active),
            PhaseState::Completed => PhaseState::Completed,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseState::Completed)
    }

    /// Phase index, with `Completed` sitting one past the last phase
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            PhaseState::Active(phase) => phase.index(),
            PhaseState::Completed => Phase::COUNT,
        }
    }

    #[must_use]
    pub fn active_phase(self) -> Option<Phase> {
        match self {
            PhaseState::Active(phase) => Some(phase),
            PhaseState::Completed => None,
        }
    }
}
