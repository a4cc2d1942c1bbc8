use super::state::LearnerState;
use super::store::{decode_state, LearnerStore};
use crate::app_dirs::AppDirs;
use crate::curriculum::{Curriculum, TierId};
use crate::error::StoreError;
use crate::progression::OutcomeSummary;
use crate::util::mean;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// One completed quiz as kept in the history table
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRecord {
    pub tier: TierId,
    pub correct: u32,
    pub total: u32,
    pub xp: u64,
    pub newly_mastered: u32,
    pub completed_at: DateTime<Local>,
}

/// Aggregate over a tier's quiz history
#[derive(Debug, Clone, PartialEq)]
pub struct TierHistory {
    pub tier: TierId,
    pub quizzes: usize,
    /// Mean per-quiz accuracy in percent, `None` without history.
    pub mean_accuracy: Option<f64>,
    pub total_xp: u64,
}

/// Learner state and quiz history in a SQLite database
#[derive(Debug)]
pub struct SqliteLearnerStore {
    conn: Connection,
}

impl SqliteLearnerStore {
    /// Open the database at the default location, creating it if needed
    pub fn new() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("joyo_ladder.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS learner_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tier TEXT NOT NULL,
                correct INTEGER NOT NULL,
                total INTEGER NOT NULL,
                xp INTEGER NOT NULL,
                newly_mastered INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quiz_history_tier ON quiz_history(tier)",
            [],
        )?;

        Ok(Self { conn })
    }

    fn write_state(conn: &Connection, state: &LearnerState) -> Result<(), StoreError> {
        let document = serde_json::to_string(state)?;
        conn.execute(
            r#"
            INSERT INTO learner_state (id, document, updated_at) VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
            params![document, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Quizzes played on `tier`, most recent first
    pub fn history_for_tier(&self, tier: &TierId) -> Result<Vec<QuizRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tier, correct, total, xp, newly_mastered, completed_at
            FROM quiz_history
            WHERE tier = ?1
            ORDER BY id DESC
            "#,
        )?;

        let rows = stmt.query_map([tier.as_str()], |row| {
            let completed_str: String = row.get(5)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        5,
                        "completed_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(QuizRecord {
                tier: TierId::new(row.get::<_, String>(0)?),
                correct: row.get(1)?,
                total: row.get(2)?,
                xp: row.get::<_, i64>(3)?.max(0) as u64,
                newly_mastered: row.get(4)?,
                completed_at,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn tier_summary(&self, tier: &TierId) -> Result<TierHistory, StoreError> {
        let records = self.history_for_tier(tier)?;
        let accuracies: Vec<f64> = records
            .iter()
            .filter(|r| r.total > 0)
            .map(|r| r.correct as f64 * 100.0 / r.total as f64)
            .collect();

        Ok(TierHistory {
            tier: tier.clone(),
            quizzes: records.len(),
            mean_accuracy: mean(&accuracies),
            total_xp: records.iter().map(|r| r.xp).sum(),
        })
    }

    /// Number of quizzes recorded across all tiers
    pub fn quiz_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quiz_history", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Forget the learner entirely (history and state)
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM quiz_history", [])?;
        self.conn.execute("DELETE FROM learner_state", [])?;
        Ok(())
    }
}

impl LearnerStore for SqliteLearnerStore {
    fn load(&self, curriculum: &Curriculum) -> Result<LearnerState, StoreError> {
        let document: Option<String> = self
            .conn
            .query_row("SELECT document FROM learner_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .inspect_err(|e| tracing::warn!("cannot read learner database: {e}"))?;

        Ok(match document {
            Some(doc) => decode_state(doc.as_bytes(), curriculum, "learner database"),
            None => LearnerState::initial(curriculum),
        })
    }

    fn save(&mut self, state: &LearnerState) -> Result<(), StoreError> {
        Self::write_state(&self.conn, state)
    }

    /// State and history row commit together or not at all
    fn save_outcome(&mut self, summary: &OutcomeSummary) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        Self::write_state(&tx, &summary.state)?;
        tx.execute(
            r#"
            INSERT INTO quiz_history (tier, correct, total, xp, newly_mastered, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                summary.tier.as_str(),
                summary.score.correct as i64,
                summary.score.total as i64,
                summary.gained_xp as i64,
                summary.newly_mastered as i64,
                summary.completed_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }
}
