//! # SQLite backing
//!
//! Relational backing for deployments that need the board to survive a
//! restart.
//!
//! - WAL journal mode with a busy timeout, schema applied on open
//! - Single-connection pool: SQLite permits limited write concurrency, and
//!   one writer keeps check-then-insert serialized without "database is
//!   locked" failures
//! - `UNIQUE(feature_id, session_id)` on the votes table backs the
//!   one-vote-per-pair invariant even if a duplicate insert races past the
//!   service-level check
//! - `record_vote` runs as one transaction: ledger insert and counter
//!   increment commit together or not at all

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    Pool, Row, Sqlite,
    error::ErrorKind,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow},
};

use super::{FeatureRepo, Storage, VoteRepo};
use crate::error::AppError;
use crate::models::{Feature, FeatureStatus, NewFeature, Vote};
use crate::utils::validate_title;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS features (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      title TEXT NOT NULL,
      description TEXT NOT NULL DEFAULT '',
      status TEXT NOT NULL DEFAULT 'pending',
      votes INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS votes (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      feature_id INTEGER NOT NULL REFERENCES features(id),
      session_id TEXT NOT NULL,
      created_at TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_feature_session
      ON votes(feature_id, session_id);
";

pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }
}

fn feature_from_row(row: &SqliteRow) -> Result<Feature, AppError> {
    let status: String = row.try_get("status")?;

    Ok(Feature {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: FeatureStatus::parse(&status).ok_or_else(|| {
            AppError::Internal(format!("unrecognized status in database: {status}").into())
        })?,
        votes: row.try_get("votes")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl FeatureRepo for SqliteStore {
    async fn list_features(&self) -> Result<Vec<Feature>, AppError> {
        let rows = sqlx::query("SELECT * FROM features ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(feature_from_row).collect()
    }

    async fn feature(&self, id: i64) -> Result<Feature, AppError> {
        let row = sqlx::query("SELECT * FROM features WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;

        feature_from_row(&row)
    }

    async fn create_feature(&self, new: NewFeature) -> Result<Feature, AppError> {
        let title = validate_title(&new.title)?;
        let description = new.description.unwrap_or_default();
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO features (title, description, status, votes, created_at)
             VALUES (?, ?, 'pending', 0, ?)",
        )
        .bind(&title)
        .bind(&description)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Feature {
            id: result.last_insert_rowid(),
            title,
            description,
            status: FeatureStatus::Pending,
            votes: 0,
            created_at,
        })
    }

    async fn set_status(&self, id: i64, status: FeatureStatus) -> Result<Feature, AppError> {
        let result = sqlx::query("UPDATE features SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        self.feature(id).await
    }

    async fn increment_votes(&self, id: i64) -> Result<Feature, AppError> {
        // Read-modify-write happens inside the database, not in Rust.
        let result = sqlx::query("UPDATE features SET votes = votes + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        self.feature(id).await
    }
}

#[async_trait]
impl VoteRepo for SqliteStore {
    async fn has_voted(&self, feature_id: i64, session_id: &str) -> Result<bool, AppError> {
        let voted: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM votes WHERE feature_id = ? AND session_id = ?)",
        )
        .bind(feature_id)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(voted)
    }

    async fn record_vote(&self, feature_id: i64, session_id: &str) -> Result<Vote, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM features WHERE id = ?)")
            .bind(feature_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound);
        }

        let created_at = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO votes (feature_id, session_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(feature_id)
        .bind(session_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await;

        // The unique index is the ledger's last line of defense; a racing
        // duplicate surfaces here as a constraint violation.
        let result = match inserted {
            Ok(result) => result,
            Err(sqlx::Error::Database(db)) if db.kind() == ErrorKind::UniqueViolation => {
                return Err(AppError::AlreadyVoted);
            }
            Err(err) => return Err(err.into()),
        };

        sqlx::query("UPDATE features SET votes = votes + 1 WHERE id = ?")
            .bind(feature_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Vote {
            id: result.last_insert_rowid(),
            feature_id,
            session_id: session_id.to_string(),
            created_at,
        })
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
