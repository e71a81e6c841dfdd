//! Counsel Sim - simulated counseling practice sessions
//!
//! Tracks a counseling dialogue through its four phases, collects MITI
//! feedback scores, and persists sessions in SQLite.

pub mod config;
pub mod db;
pub mod dialogue;
pub mod feedback;
pub mod session;

pub use config::{ConfigError, SimConfig};
pub use db::{Database, DbError, DbResult};
pub use dialogue::{Dialogue, DialogueError, Phase, PhaseState, Role, TurnPolicy, Utterance};
pub use feedback::{Criterion, FeedbackError, MitiFeedback};
pub use session::{CounselingCategory, CounselingSession, DEFAULT_SESSION};
