//! Session store
//!
//! Persists counseling sessions in SQLite. The handle is opened once at
//! startup, passed to whoever needs it, and closed explicitly on shutdown.

mod schema;

pub use schema::{SCHEMA, SESSION_COLUMNS};
use schema::parse_datetime;

use crate::dialogue::{DialogueError, Role, TurnPolicy, Utterance};
use crate::session::{CounselingCategory, CounselingSession, UnknownCategory, DEFAULT_SESSION};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Session already exists: {0}")]
    SessionExists(String),
    #[error("Session cannot be deleted: {0}")]
    ProtectedSession(String),
    #[error("Corrupt session row: {0}")]
    Corrupt(String),
    #[error("Corrupt session row: {0}")]
    UnknownCategory(#[from] UnknownCategory),
    #[error("Database handle still shared by {clones} other clone(s), connection left open")]
    StillShared { clones: usize },
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    policy: TurnPolicy,
}

impl Database {
    /// Open or create database at the given path
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or the schema cannot be applied.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// Fails if the schema cannot be applied.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            policy: TurnPolicy::default(),
        })
    }

    /// Turn policy applied to sessions created through this handle
    #[must_use]
    pub fn with_turn_policy(mut self, policy: TurnPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Close the underlying connection
    ///
    /// Only the last live handle can close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StillShared`] if other clones of this handle are
    /// still alive; the connection stays open until the last one is dropped.
    /// Returns the SQLite error if the connection fails to close cleanly.
    pub fn close(self) -> DbResult<()> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|shared| {
            let clones = Arc::strong_count(&shared) - 1;
            tracing::warn!(clones, "Database close requested while handle is still shared");
            DbError::StillShared { clones }
        })?;
        let conn = mutex.into_inner().map_err(|_| DbError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
        tracing::info!("Database closed");
        Ok(())
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== Session Operations ====================

    /// Make sure the default session exists
    ///
    /// Returns the name of the session to select first.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn ensure_default_session(&self) -> DbResult<String> {
        let conn = self.conn()?;

        if !session_exists(&conn, DEFAULT_SESSION)? {
            let session = CounselingSession::new(
                DEFAULT_SESSION,
                CounselingCategory::default(),
                "",
                self.policy,
            );
            insert_session(&conn, &session)?;
            tracing::info!(name = DEFAULT_SESSION, "Created default session");
        }

        first_session_name(&conn)?.ok_or_else(|| DbError::SessionNotFound(DEFAULT_SESSION.to_string()))
    }

    /// Create a new session with an empty dialogue and no feedback
    ///
    /// # Errors
    ///
    /// Returns [`DbError::SessionExists`] if the name is taken.
    pub fn create_session(
        &self,
        chat_name: &str,
        category: CounselingCategory,
        seed_concern: &str,
    ) -> DbResult<CounselingSession> {
        let conn = self.conn()?;

        if session_exists(&conn, chat_name)? {
            return Err(DbError::SessionExists(chat_name.to_string()));
        }

        let session = CounselingSession::new(chat_name, category, seed_concern, self.policy);
        insert_session(&conn, &session)?;
        tracing::info!(name = %chat_name, category = %category, "Created session");
        Ok(session)
    }

    /// Get a session by name
    ///
    /// # Errors
    ///
    /// Returns [`DbError::SessionNotFound`] if no session has that name.
    pub fn get_session(&self, chat_name: &str) -> DbResult<CounselingSession> {
        let conn = self.conn()?;
        load_session(&conn, chat_name)
    }

    /// Names of all sessions, oldest first
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn list_session_names(&self) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT chat_name FROM sessions ORDER BY created_at ASC, rowid ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete a session
    ///
    /// Returns the name of the session to select next. If nothing is left
    /// the default session is recreated.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ProtectedSession`] for the default session and
    /// [`DbError::SessionNotFound`] for unknown names.
    pub fn delete_session(&self, chat_name: &str) -> DbResult<String> {
        if chat_name == DEFAULT_SESSION {
            return Err(DbError::ProtectedSession(chat_name.to_string()));
        }

        {
            let conn = self.conn()?;
            let deleted = conn.execute("DELETE FROM sessions WHERE chat_name = ?1", params![chat_name])?;
            if deleted == 0 {
                return Err(DbError::SessionNotFound(chat_name.to_string()));
            }
            tracing::info!(name = %chat_name, "Deleted session");

            if let Some(next) = first_session_name(&conn)? {
                return Ok(next);
            }
        }

        self.ensure_default_session()
    }

    /// Persist a session's dialogue and feedback
    ///
    /// # Errors
    ///
    /// Returns [`DbError::SessionNotFound`] if the session was never created.
    pub fn save_session(&self, session: &CounselingSession) -> DbResult<()> {
        let conn = self.conn()?;
        write_session(&conn, session)
    }

    /// Append an utterance to a stored session's dialogue
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dialogue`] if the dialogue is already completed, in
    /// which case nothing is written.
    pub fn append_utterance(
        &self,
        chat_name: &str,
        role: Role,
        subtype: &str,
        text: &str,
    ) -> DbResult<Utterance> {
        let conn = self.conn()?;
        let mut session = load_session(&conn, chat_name)?;

        let entry = session.dialogue.append(role, subtype, text)?.clone();
        write_session(&conn, &session)?;

        tracing::debug!(
            name = %chat_name,
            role = role.as_str(),
            phase = %entry.phase,
            completed = session.dialogue.is_completed(),
            "Appended utterance"
        );
        Ok(entry)
    }

    /// Record one criterion score for a stored session
    ///
    /// # Errors
    ///
    /// Returns [`DbError::SessionNotFound`] for unknown names.
    pub fn store_feedback(
        &self,
        chat_name: &str,
        criterion: &str,
        score: i32,
        rationale: &str,
    ) -> DbResult<()> {
        let conn = self.conn()?;
        let mut session = load_session(&conn, chat_name)?;
        session.feedback.store(criterion, score, rationale);
        write_session(&conn, &session)
    }
}

fn session_exists(conn: &Connection, chat_name: &str) -> DbResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sessions WHERE chat_name = ?1)",
        params![chat_name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn first_session_name(conn: &Connection) -> DbResult<Option<String>> {
    conn.query_row(
        "SELECT chat_name FROM sessions ORDER BY created_at ASC, rowid ASC LIMIT 1",
        [],
        |row| row.get(0),
    )
    .optional()
    .map_err(DbError::from)
}

fn insert_session(conn: &Connection, session: &CounselingSession) -> DbResult<()> {
    conn.execute(
        "INSERT INTO sessions (id, chat_name, counseling_category, seed_concern, dialogue, feedback, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            session.id,
            session.chat_name,
            session.category.as_str(),
            session.seed_concern,
            serde_json::to_string(&session.dialogue)?,
            serde_json::to_string(&session.feedback)?,
            session.created_at.to_rfc3339(),
            session.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn write_session(conn: &Connection, session: &CounselingSession) -> DbResult<()> {
    let updated = conn.execute(
        "UPDATE sessions SET dialogue = ?1, feedback = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            serde_json::to_string(&session.dialogue)?,
            serde_json::to_string(&session.feedback)?,
            Utc::now().to_rfc3339(),
            session.id,
        ],
    )?;

    if updated == 0 {
        return Err(DbError::SessionNotFound(session.chat_name.clone()));
    }
    Ok(())
}

/// Raw column values of a session row
struct SessionRow {
    id: String,
    chat_name: String,
    category: String,
    seed_concern: String,
    dialogue: String,
    feedback: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn into_session(self) -> DbResult<CounselingSession> {
        let category = self.category.parse::<CounselingCategory>()?;

        Ok(CounselingSession {
            id: self.id,
            chat_name: self.chat_name,
            category,
            seed_concern: self.seed_concern,
            dialogue: serde_json::from_str(&self.dialogue)?,
            feedback: serde_json::from_str(&self.feedback)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn load_session(conn: &Connection, chat_name: &str) -> DbResult<CounselingSession> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE chat_name = ?1"
    ))?;

    let row = stmt
        .query_row(params![chat_name], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                chat_name: row.get(1)?,
                category: row.get(2)?,
                seed_concern: row.get(3)?,
                dialogue: row.get(4)?,
                feedback: row.get(5)?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::SessionNotFound(chat_name.to_string()),
            other => DbError::Sqlite(other),
        })?;

    row.into_session()
}
