//! Counsel Sim bootstrap
//!
//! Initializes logging, opens the session store, makes sure the default
//! session exists and reports what is stored.

use counsel_sim::{Database, SimConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counsel_sim=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = SimConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?.with_turn_policy(config.turn_policy);

    let current = db.ensure_default_session()?;
    let names = db.list_session_names()?;
    tracing::info!(
        current = %current,
        sessions = ?names,
        max_turns_per_phase = config.turn_policy.max_turns_per_phase,
        min_turns_per_phase = config.turn_policy.min_turns_per_phase,
        "Session store ready"
    );

    for name in &names {
        let session = db.get_session(name)?;
        tracing::info!(
            name = %session.chat_name,
            category = %session.category,
            phase = %session.dialogue.current_phase(),
            completed = session.dialogue.is_completed(),
            turns = session.dialogue.entries().len(),
            feedback_entries = session.feedback.len(),
            "Session"
        );
    }

    db.close()?;
    Ok(())
}
