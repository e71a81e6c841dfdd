//! Database schema and row helpers

use super::{DbError, DbResult};
use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    chat_name TEXT NOT NULL UNIQUE,
    counseling_category TEXT NOT NULL,
    seed_concern TEXT NOT NULL DEFAULT '',
    dialogue TEXT NOT NULL,
    feedback TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions(created_at ASC);
";

/// Columns selected for a full session row, in the field order `load_session` reads into `SessionRow`
pub const SESSION_COLUMNS: &str =
    "id, chat_name, counseling_category, seed_concern, dialogue, feedback, created_at, updated_at";

pub(super) fn parse_datetime(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("invalid timestamp {s:?}: {e}")))
}
