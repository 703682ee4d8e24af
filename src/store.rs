//! The report store the wizard and the reviewer commands talk to.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog;
use crate::error::StoreError;
use crate::models::{Category, Location, Report, ReportDraft, ReportUpdate, Symbol};

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError>;

    async fn list_symbols_by_category(&self, category: Category) -> Result<Vec<Symbol>, StoreError>;

    /// Assigns id, timestamp and `pending` status.
    async fn create_report(&self, draft: &ReportDraft) -> Result<Report, StoreError>;

    /// Newest first.
    async fn list_reports(&self) -> Result<Vec<Report>, StoreError>;

    async fn list_reports_for_student(&self, student_id: &str) -> Result<Vec<Report>, StoreError> {
        let reports = self.list_reports().await?;
        Ok(reports
            .into_iter()
            .filter(|report| report.student_id == student_id)
            .collect())
    }

    /// Last write wins.
    async fn update_report(&self, id: Uuid, update: &ReportUpdate) -> Result<(), StoreError>;
}

/// Process-local store backed by the built-in catalog. Can be switched
/// offline to refuse every call.
#[derive(Debug)]
pub struct MemoryReportStore {
    locations: Vec<Location>,
    reports: Mutex<Vec<Report>>,
    offline: AtomicBool,
}

impl Default for MemoryReportStore {
    fn default() -> Self {
        Self::with_locations(catalog::default_locations())
    }
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(locations: Vec<Location>) -> Self {
        Self {
            locations,
            reports: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Inserts an already-built report as-is (imports, fixtures).
    pub async fn insert(&self, report: Report) {
        self.reports.lock().await.push(report);
    }

    pub async fn len(&self) -> usize {
        self.reports.lock().await.len()
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        self.ensure_online()?;
        Ok(self.locations.clone())
    }

    async fn list_symbols_by_category(&self, category: Category) -> Result<Vec<Symbol>, StoreError> {
        self.ensure_online()?;
        Ok(catalog::symbols_in(category))
    }

    async fn create_report(&self, draft: &ReportDraft) -> Result<Report, StoreError> {
        self.ensure_online()?;
        draft.validate()?;
        let report = Report::from_draft(draft.clone(), Uuid::new_v4(), Utc::now());
        self.reports.lock().await.push(report.clone());
        Ok(report)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        self.ensure_online()?;
        let mut reports = self.reports.lock().await.clone();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn update_report(&self, id: Uuid, update: &ReportUpdate) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut reports = self.reports.lock().await;
        let report = reports
            .iter_mut()
            .find(|report| report.id == id)
            .ok_or(StoreError::NotFound(id))?;
        report.apply(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EmotionScale, Frequency, ReportStatus, SafetyThermometer, SymbolSelection,
    };

    fn draft(student_id: &str) -> ReportDraft {
        ReportDraft {
            student_id: student_id.to_string(),
            student_name: "Noa".to_string(),
            symbols: vec![SymbolSelection {
                id: "mock".to_string(),
                label: "Se moquer".to_string(),
                category: Category::Verbal,
            }],
            body_map: None,
            emotion: EmotionScale::from_level(3).unwrap(),
            location: catalog::default_locations()[0].clone(),
            frequency: Frequency::Often,
            safety: SafetyThermometer::from_level(3).unwrap(),
        }
    }

    #[tokio::test]
    async fn created_reports_start_pending() {
        let store = MemoryReportStore::new();
        let report = store.create_report(&draft("student-001")).await.unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.teacher_notes.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn invalid_drafts_are_rejected() {
        let store = MemoryReportStore::new();
        let mut bad = draft("student-001");
        bad.symbols.clear();
        let result = store.create_report(&bad).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let store = MemoryReportStore::new();
        let report = store.create_report(&draft("student-001")).await.unwrap();
        store
            .update_report(
                report.id,
                &ReportUpdate {
                    status: None,
                    teacher_notes: Some("spoke with class".to_string()),
                },
            )
            .await
            .unwrap();
        store
            .update_report(
                report.id,
                &ReportUpdate {
                    status: Some(ReportStatus::Reviewed),
                    teacher_notes: None,
                },
            )
            .await
            .unwrap();

        let stored = &store.list_reports().await.unwrap()[0];
        assert_eq!(stored.status, ReportStatus::Reviewed);
        assert_eq!(stored.teacher_notes.as_deref(), Some("spoke with class"));
    }

    #[tokio::test]
    async fn unknown_report_is_not_found() {
        let store = MemoryReportStore::new();
        let result = store.update_report(Uuid::new_v4(), &ReportUpdate::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn filters_reports_by_student() {
        let store = MemoryReportStore::new();
        store.create_report(&draft("student-001")).await.unwrap();
        store.create_report(&draft("student-002")).await.unwrap();
        store.create_report(&draft("student-001")).await.unwrap();
        assert_eq!(store.list_reports_for_student("student-001").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryReportStore::new();
        let now = Utc::now();
        for days_ago in [5, 1, 3] {
            let report = Report::from_draft(
                draft("student-001"),
                Uuid::new_v4(),
                now - chrono::Duration::days(days_ago),
            );
            store.insert(report).await;
        }

        let listed = store.list_reports().await.unwrap();
        let ages: Vec<i64> = listed
            .iter()
            .map(|report| (now - report.created_at).num_days())
            .collect();
        assert_eq!(ages, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn offline_store_refuses_calls() {
        let store = MemoryReportStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.list_locations().await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_offline(false);
        assert_eq!(store.list_locations().await.unwrap().len(), 7);
    }
}
