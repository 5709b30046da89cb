//! Report store
//!
//! Append-only persisted collection of submitted reports. Each append is a
//! single INSERT, so appends are atomic with respect to each other and a
//! reader never observes a partially written report. `list_all` returns
//! insertion order (rowid ascending).

use chrono::{DateTime, Utc};
use kashif_common::types::{Report, ReportStatus};
use kashif_common::{Error, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Append-only report persistence
#[derive(Clone)]
pub struct ReportStore {
    pool: SqlitePool,
}

impl ReportStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// In-memory store for tests
    ///
    /// A single connection keeps every query on the same in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        crate::db::init_tables(&pool).await?;
        Ok(Self { pool })
    }

    /// Append a report, returning its stored id
    pub async fn append(&self, report: &Report) -> Result<Uuid> {
        let draft = serde_json::to_string(&report.draft)
            .map_err(|e| Error::Internal(format!("draft serialization: {}", e)))?;
        let decision = report
            .decision
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Internal(format!("decision serialization: {}", e)))?;

        sqlx::query(
            "INSERT INTO reports (report_id, draft, decision, status, submitted_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(report.id.to_string())
        .bind(draft)
        .bind(decision)
        .bind(report.status.as_str())
        .bind(report.submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(report.id)
    }

    /// All reports in insertion order
    pub async fn list_all(&self) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>, String, String)>(
            "SELECT report_id, draft, decision, status, submitted_at \
             FROM reports ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_report).collect()
    }

    /// Look up one report by id
    pub async fn get(&self, id: Uuid) -> Result<Report> {
        let row = sqlx::query_as::<_, (String, String, Option<String>, String, String)>(
            "SELECT report_id, draft, decision, status, submitted_at \
             FROM reports WHERE report_id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("report {}", id)))?;

        row_to_report(row)
    }
}

fn row_to_report(
    (report_id, draft, decision, status, submitted_at): (
        String,
        String,
        Option<String>,
        String,
        String,
    ),
) -> Result<Report> {
    Ok(Report {
        id: Uuid::parse_str(&report_id)
            .map_err(|e| Error::Internal(format!("stored report id: {}", e)))?,
        draft: serde_json::from_str(&draft)
            .map_err(|e| Error::Internal(format!("stored draft: {}", e)))?,
        decision: decision
            .map(|d| serde_json::from_str(&d))
            .transpose()
            .map_err(|e| Error::Internal(format!("stored decision: {}", e)))?,
        status: ReportStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("stored status: {}", status)))?,
        submitted_at: DateTime::parse_from_rfc3339(&submitted_at)
            .map_err(|e| Error::Internal(format!("stored timestamp: {}", e)))?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kashif_common::types::{ClassificationDecision, ReportDraft, Severity};

    fn sample_report(description: &str) -> Report {
        Report {
            id: Uuid::new_v4(),
            draft: ReportDraft {
                vehicle_image_ref: Some("vehicle.jpg".to_string()),
                road_image_ref: Some("road.jpg".to_string()),
                description: description.to_string(),
                location_text: "King Fahd Road".to_string(),
                occurred_at: Utc::now(),
            },
            decision: Some(ClassificationDecision {
                label: "Pothole".to_string(),
                display_name: "Road pothole".to_string(),
                icon: "🕳️".to_string(),
                severity: Severity::Severe,
                responsible_party: "Municipal roads authority".to_string(),
                confidence: 0.91,
            }),
            status: ReportStatus::Created,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_then_list_round_trips_exactly() {
        let store = ReportStore::in_memory().await.unwrap();

        let report = sample_report("Hit a deep pothole");
        store.append(&report).await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed, vec![report]);
    }

    #[tokio::test]
    async fn test_list_all_preserves_insertion_order() {
        let store = ReportStore::in_memory().await.unwrap();

        let first = sample_report("first");
        let second = sample_report("second");
        let third = sample_report("third");
        for report in [&first, &second, &third] {
            store.append(report).await.unwrap();
        }

        let listed = store.list_all().await.unwrap();
        let descriptions: Vec<_> = listed.iter().map(|r| r.draft.description.as_str()).collect();
        assert_eq!(descriptions, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_report_without_decision_round_trips() {
        let store = ReportStore::in_memory().await.unwrap();

        let mut report = sample_report("no decision");
        report.decision = None;
        store.append(&report).await.unwrap();

        assert_eq!(store.get(report.id).await.unwrap(), report);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let store = ReportStore::in_memory().await.unwrap();
        assert!(matches!(
            store.get(Uuid::new_v4()).await,
            Err(Error::NotFound(_))
        ));
    }
}
