//! Counseling dialogue phase tracking
//!
//! A dialogue moves through four fixed phases. Every appended utterance is
//! stamped with the phase active at the time, and a phase closes once it has
//! collected its quota of turns.

pub mod phase;
mod tracker;
pub mod utterance;

#[cfg(test)]
mod proptests;

pub use phase::{Phase, PhaseState};
pub use tracker::{Dialogue, DialogueError, TurnPolicy, MAX_TURNS_PER_PHASE, MIN_TURNS_PER_PHASE};
pub use utterance::{Role, Utterance};
