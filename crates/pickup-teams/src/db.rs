// SQLite persistence for saved formations.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::formation::color::TeamColor;
use crate::formation::error::StorageError;
use crate::formation::saved::{name_key, FormationStore, NewFormation, SavedFormation};

const SELECT_COLUMNS: &str = "id, name, team1_player_ids, team2_player_ids, team1_color, \
                              team2_color, times_used, last_used_at, created_at";

/// SQLite-backed [`FormationStore`].
pub struct Database {
    conn: Mutex<Connection>,
}

/// A formation row before its JSON and timestamp columns are decoded.
struct RawFormation {
    id: i64,
    name: String,
    team1_player_ids: String,
    team2_player_ids: String,
    team1_color: String,
    team2_color: String,
    times_used: u32,
    last_used_at: Option<String>,
    created_at: String,
}

impl RawFormation {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawFormation {
            id: row.get(0)?,
            name: row.get(1)?,
            team1_player_ids: row.get(2)?,
            team2_player_ids: row.get(3)?,
            team1_color: row.get(4)?,
            team2_color: row.get(5)?,
            times_used: row.get(6)?,
            last_used_at: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<SavedFormation, StorageError> {
        let id = self.id;
        let color = |key: &str| {
            TeamColor::from_storage_key(key).ok_or_else(|| StorageError::Corrupt {
                id,
                message: format!("unknown color `{key}`"),
            })
        };
        let timestamp = |value: &str| {
            DateTime::parse_from_rfc3339(value)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StorageError::Corrupt {
                    id,
                    message: format!("bad timestamp `{value}`: {e}"),
                })
        };

        Ok(SavedFormation {
            id,
            team1_player_ids: serde_json::from_str(&self.team1_player_ids)?,
            team2_player_ids: serde_json::from_str(&self.team2_player_ids)?,
            team1_color: color(&self.team1_color)?,
            team2_color: color(&self.team2_color)?,
            times_used: self.times_used,
            last_used_at: self.last_used_at.as_deref().map(timestamp).transpose()?,
            created_at: timestamp(&self.created_at)?,
            name: self.name,
        })
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS saved_formations (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                name             TEXT NOT NULL,
                name_key         TEXT NOT NULL UNIQUE,
                team1_player_ids TEXT NOT NULL,
                team2_player_ids TEXT NOT NULL,
                team1_color      TEXT NOT NULL,
                team2_color      TEXT NOT NULL,
                times_used       INTEGER NOT NULL DEFAULT 0,
                last_used_at     TEXT,
                created_at       TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A poisoned lock still guards a consistent connection: every write runs
    /// in a single statement or transaction.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fetch(conn: &Connection, id: i64) -> Result<SavedFormation, StorageError> {
        let raw = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM saved_formations WHERE id = ?1"),
                params![id],
                RawFormation::from_row,
            )
            .optional()?
            .ok_or(StorageError::NotFound { id })?;
        raw.decode()
    }

    pub fn list_formations(&self) -> Result<Vec<SavedFormation>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM saved_formations
             ORDER BY last_used_at IS NULL, last_used_at DESC, name COLLATE NOCASE"
        ))?;
        let rows = stmt
            .query_map([], RawFormation::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawFormation::decode).collect()
    }

    pub fn insert_formation(
        &self,
        formation: &NewFormation,
        created_at: DateTime<Utc>,
    ) -> Result<SavedFormation, StorageError> {
        let conn = self.conn();
        let inserted = conn.query_row(
            "INSERT INTO saved_formations
                (name, name_key, team1_player_ids, team2_player_ids, team1_color, team2_color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id",
            params![
                formation.name,
                name_key(&formation.name),
                serde_json::to_string(&formation.team1_player_ids)?,
                serde_json::to_string(&formation.team2_player_ids)?,
                formation.team1_color.storage_key(),
                formation.team2_color.storage_key(),
                format_timestamp(created_at),
            ],
            |row| row.get::<_, i64>(0),
        );

        let id = match inserted {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::DuplicateName {
                    name: formation.name.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Self::fetch(&conn, id)
    }

    /// Bump usage bookkeeping and return the updated record, atomically.
    pub fn use_formation(&self, id: i64, used_at: DateTime<Utc>) -> Result<SavedFormation, StorageError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE saved_formations
             SET times_used = times_used + 1, last_used_at = ?2
             WHERE id = ?1",
            params![id, format_timestamp(used_at)],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound { id });
        }
        let formation = Self::fetch(&tx, id)?;
        tx.commit()?;
        Ok(formation)
    }

    pub fn rename_formation(&self, id: i64, name: &str) -> Result<SavedFormation, StorageError> {
        let conn = self.conn();
        let updated = match conn.execute(
            "UPDATE saved_formations SET name = ?2, name_key = ?3 WHERE id = ?1",
            params![id, name, name_key(name)],
        ) {
            Ok(n) => n,
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::DuplicateName {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if updated == 0 {
            return Err(StorageError::NotFound { id });
        }
        Self::fetch(&conn, id)
    }

    pub fn delete_formation(&self, id: i64) -> Result<(), StorageError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM saved_formations WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound { id });
        }
        Ok(())
    }
}

#[async_trait]
impl FormationStore for Database {
    async fn list(&self) -> Result<Vec<SavedFormation>, StorageError> {
        self.list_formations()
    }

    async fn save(
        &self,
        formation: &NewFormation,
        created_at: DateTime<Utc>,
    ) -> Result<SavedFormation, StorageError> {
        self.insert_formation(formation, created_at)
    }

    async fn load(&self, id: i64, used_at: DateTime<Utc>) -> Result<SavedFormation, StorageError> {
        self.use_formation(id, used_at)
    }

    async fn rename(&self, id: i64, name: &str) -> Result<SavedFormation, StorageError> {
        self.rename_formation(id, name)
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.delete_formation(id)
    }
}
