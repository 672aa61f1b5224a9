//! SQLite persistence for incidents and feedback.
//!
//! Storage is optional: the scan pipeline returns full in-memory reports
//! whether or not a pool is configured, and persistence failures are logged
//! rather than propagated to the caller holding a finished report.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use log::{error, info};
use sqlx::{Row, SqlitePool};

use crate::error_handling::ScanError;
use crate::incident::feedback::{FeedbackStats, FeedbackType, UserFeedback};
use crate::incident::IncidentReport;

/// Incident and feedback tables behind one pool.
#[derive(Debug, Clone)]
pub struct IncidentStore {
    pool: SqlitePool,
}

impl IncidentStore {
    /// Opens (creating if needed) a file-backed store with WAL mode enabled.
    pub async fn open(db_path: &Path) -> Result<Self, ScanError> {
        let db_path_str = db_path.to_string_lossy().to_string();
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&db_path_str)
        {
            Ok(_) => info!("Incident database file created."),
            Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("Incident database file already exists.")
            }
            Err(e) => {
                error!("Failed to create incident database file: {e}");
                return Err(ScanError::StorageUnavailable(e.to_string()));
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{db_path_str}"))
            .await
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        // WAL mode for concurrent access
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Opens an in-memory store. Used by tests and ephemeral scans.
    pub async fn open_in_memory() -> Result<Self, ScanError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), ScanError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS incidents (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                url TEXT NOT NULL,
                severity TEXT NOT NULL,
                category TEXT NOT NULL,
                overall_risk_score INTEGER NOT NULL,
                report TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id TEXT PRIMARY KEY,
                incident_id TEXT,
                url TEXT NOT NULL,
                feedback_type TEXT NOT NULL,
                comment TEXT,
                user_id TEXT,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (incident_id) REFERENCES incidents(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Persists an incident report. The full report is stored as JSON so
    /// the SIEM export sees exactly what the caller saw.
    pub async fn insert_incident(&self, report: &IncidentReport) -> Result<(), ScanError> {
        let report_json = serde_json::to_string(report)
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        sqlx::query(
            "INSERT INTO incidents (id, timestamp, url, severity, category, overall_risk_score, report)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&report.id)
        .bind(report.timestamp.to_rfc3339())
        .bind(&report.url)
        .bind(report.severity.as_str())
        .bind(report.category.as_str())
        .bind(report.overall_risk_score as i64)
        .bind(report_json)
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }

    pub async fn insert_feedback(&self, feedback: &UserFeedback) -> Result<(), ScanError> {
        sqlx::query(
            "INSERT INTO feedback (id, incident_id, url, feedback_type, comment, user_id, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&feedback.id)
        .bind(&feedback.incident_id)
        .bind(&feedback.url)
        .bind(feedback.feedback_type.as_str())
        .bind(&feedback.comment)
        .bind(&feedback.user_id)
        .bind(feedback.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Looks up one incident by id.
    pub async fn get_incident(&self, id: &str) -> Result<Option<IncidentReport>, ScanError> {
        let row = sqlx::query("SELECT report FROM incidents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let json: String = row.get("report");
                let report: IncidentReport = serde_json::from_str(&json)
                    .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    /// The most recent incidents, newest first.
    pub async fn recent_incidents(&self, limit: u32) -> Result<Vec<IncidentReport>, ScanError> {
        let rows = sqlx::query("SELECT report FROM incidents ORDER BY timestamp DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let json: String = row.get("report");
            let report: IncidentReport = serde_json::from_str(&json)
                .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Aggregate feedback counts by type.
    pub async fn feedback_stats(&self) -> Result<FeedbackStats, ScanError> {
        let rows = sqlx::query("SELECT feedback_type, COUNT(*) AS n FROM feedback GROUP BY feedback_type")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScanError::StorageUnavailable(e.to_string()))?;

        let mut stats = FeedbackStats::default();
        for row in rows {
            let feedback_type: String = row.get("feedback_type");
            let count: i64 = row.get("n");
            let count = count as u64;
            stats.total += count;
            match FeedbackType::from_str_code(&feedback_type) {
                Some(FeedbackType::FalsePositive) => stats.false_positives = count,
                Some(FeedbackType::ConfirmedPhish) => stats.confirmed_phish = count,
                Some(FeedbackType::BenignTest) => stats.benign_test = count,
                Some(FeedbackType::Other) | None => stats.other += count,
            }
        }
        Ok(stats)
    }
}
