use super::types::{Department, IssueCategory};
use crate::error::{CivisError, ValidationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const MIN_REPORT_CHARS: usize = 50;
pub const MAX_REPORT_CHARS: usize = 1000;
const DRAFT_SUMMARY_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueStatus {
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl IssueStatus {
    /// Status only moves forward; re-applying the current status is a no-op.
    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        next >= self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub id: String,
    pub category: IssueCategory,
    pub report_text: String,
    pub summary: String,
    pub status: IssueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    /// Reference to an attached image (URL or data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl IssueReport {
    /// Creates a new citizen submission after checking the report length.
    pub fn submit(category: IssueCategory, report_text: &str, image: Option<String>) -> Result<Self, CivisError> {
        let text = report_text.trim();
        let len = text.chars().count();
        if len < MIN_REPORT_CHARS {
            return Err(ValidationError::new("reportText", format!("minLength {MIN_REPORT_CHARS}"), format!("length {len}")).into());
        }
        if len > MAX_REPORT_CHARS {
            return Err(ValidationError::new("reportText", format!("maxLength {MAX_REPORT_CHARS}"), format!("length {len}")).into());
        }

        let draft: String = text.chars().take(DRAFT_SUMMARY_CHARS).collect();
        let short_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();

        Ok(Self {
            id: format!("CIV-{}", short_id.to_uppercase()),
            category,
            report_text: text.to_string(),
            summary: format!("{draft}..."),
            status: IssueStatus::New,
            department: None,
            image,
        })
    }
}

/// Storage for issue records. The AI layer only reads category and report
/// text and writes back summaries and departments.
#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn list(&self) -> Vec<IssueReport>;
    async fn get(&self, id: &str) -> Result<IssueReport, CivisError>;
    async fn insert(&self, issue: IssueReport) -> Result<(), CivisError>;
    async fn update_status(&self, id: &str, status: IssueStatus) -> Result<IssueReport, CivisError>;
    async fn assign_department(&self, id: &str, department: Department) -> Result<IssueReport, CivisError>;
    async fn update_summary(&self, id: &str, summary: &str) -> Result<IssueReport, CivisError>;
}

/// Newest-first in-memory store.
#[derive(Default)]
pub struct InMemoryIssueStore {
    issues: RwLock<Vec<IssueReport>>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issues(issues: Vec<IssueReport>) -> Self {
        Self { issues: RwLock::new(issues) }
    }

    pub fn seeded() -> Self {
        Self::with_issues(sample_issues())
    }

    async fn modify<F>(&self, id: &str, apply: F) -> Result<IssueReport, CivisError>
    where
        F: FnOnce(&mut IssueReport) -> Result<(), CivisError> + Send,
    {
        let mut issues = self.issues.write().await;
        let issue = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CivisError::NotFound(format!("issue {id}")))?;
        apply(issue)?;
        Ok(issue.clone())
    }
}

#[async_trait]
impl IssueStore for InMemoryIssueStore {
    async fn list(&self) -> Vec<IssueReport> {
        self.issues.read().await.clone()
    }

    async fn get(&self, id: &str) -> Result<IssueReport, CivisError> {
        self.issues
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| CivisError::NotFound(format!("issue {id}")))
    }

    async fn insert(&self, issue: IssueReport) -> Result<(), CivisError> {
        let mut issues = self.issues.write().await;
        if issues.iter().any(|i| i.id == issue.id) {
            return Err(ValidationError::new("id", "unique", issue.id).into());
        }
        log::info!("📥 Issue {} submitted ({})", issue.id, issue.category);
        issues.insert(0, issue);
        Ok(())
    }

    async fn update_status(&self, id: &str, status: IssueStatus) -> Result<IssueReport, CivisError> {
        self.modify(id, |issue| {
            if !issue.status.can_transition_to(status) {
                return Err(ValidationError::new(
                    "status",
                    format!("forward transition from {:?}", issue.status),
                    format!("{status:?}"),
                )
                .into());
            }
            issue.status = status;
            Ok(())
        })
        .await
    }

    async fn assign_department(&self, id: &str, department: Department) -> Result<IssueReport, CivisError> {
        self.modify(id, |issue| {
            issue.department = Some(department);
            Ok(())
        })
        .await
    }

    async fn update_summary(&self, id: &str, summary: &str) -> Result<IssueReport, CivisError> {
        let summary = summary.to_string();
        self.modify(id, move |issue| {
            issue.summary = summary;
            Ok(())
        })
        .await
    }
}

fn sample(id: &str, category: IssueCategory, report: &str, summary: &str, status: IssueStatus, image: Option<&str>) -> IssueReport {
    IssueReport {
        id: id.to_string(),
        category,
        report_text: report.to_string(),
        summary: summary.to_string(),
        status,
        department: None,
        image: image.map(String::from),
    }
}

/// Demo records for the dashboard.
pub fn sample_issues() -> Vec<IssueReport> {
    use IssueCategory::*;
    use IssueStatus::*;
    vec![
        sample("CIV-001", RoadMaintenance, "Large pothole on the corner of Main St and 2nd Ave, causing traffic issues.", "Pothole at Main & 2nd causing traffic disruption.", New, None),
        sample("CIV-002", PublicSafety, "Streetlight is out on Elm Street between 3rd and 4th.", "Streetlight outage on Elm St.", InProgress, None),
        sample("CIV-003", Sanitation, "Public trash can on Oak Ave is overflowing and has not been collected for days.", "Overflowing public trash can on Oak Ave.", New, None),
        sample("CIV-004", ParksRec, "Broken swing at Central Park playground.", "Broken equipment at Central Park playground.", Resolved, None),
        sample("CIV-005", NoiseComplaint, "Loud construction noise before 7 AM near Pine St.", "Early morning construction noise on Pine St.", Resolved, None),
        sample("CIV-006", Sanitation, "Missed garbage collection on Maple Avenue for the third time this month.", "Repeated missed garbage collection on Maple Ave.", New, Some("https://picsum.photos/seed/6/600/400")),
        sample("CIV-007", RoadMaintenance, "The traffic light at the intersection of Washington and Lincoln is not working correctly. It is stuck on red.", "Malfunctioning traffic light at Washington/Lincoln.", InProgress, None),
        sample("CIV-008", PublicSafety, "A large group of people are gathering in the park after hours, causing a disturbance.", "After-hours disturbance in park.", New, None),
        sample("CIV-009", Other, "Abandoned vehicle has been parked on Birch Street for over a week. License plate XYZ 123.", "Abandoned vehicle on Birch Street.", New, None),
        sample("CIV-010", ParksRec, "The water fountain at City Hall Plaza is leaking, creating a large puddle.", "Leaking water fountain at City Hall Plaza.", Resolved, Some("https://picsum.photos/seed/10/600/400")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Public trash can on Oak Ave is overflowing and has not been collected for days.";

    #[test]
    fn submission_enforces_length_bounds() {
        let err = IssueReport::submit(IssueCategory::Sanitation, "Too short.", None).unwrap_err();
        assert_eq!(err.violation().unwrap().constraint, "minLength 50");

        let long = "x".repeat(1001);
        let err = IssueReport::submit(IssueCategory::Sanitation, &long, None).unwrap_err();
        assert_eq!(err.violation().unwrap().constraint, "maxLength 1000");
    }

    #[test]
    fn submission_drafts_summary_and_id() {
        let issue = IssueReport::submit(IssueCategory::Sanitation, REPORT, None).unwrap();
        assert_eq!(issue.status, IssueStatus::New);
        assert!(issue.id.starts_with("CIV-"));
        assert_eq!(issue.id.len(), 12);
        assert_eq!(issue.summary, format!("{}...", &REPORT[..50]));
    }

    #[test]
    fn status_only_moves_forward() {
        assert!(IssueStatus::New.can_transition_to(IssueStatus::InProgress));
        assert!(IssueStatus::New.can_transition_to(IssueStatus::Resolved));
        assert!(IssueStatus::InProgress.can_transition_to(IssueStatus::InProgress));
        assert!(!IssueStatus::Resolved.can_transition_to(IssueStatus::New));
    }

    #[test]
    fn status_serializes_with_display_labels() {
        assert_eq!(serde_json::to_value(IssueStatus::InProgress).unwrap(), "In Progress");
    }

    #[tokio::test]
    async fn store_round_trips_updates() {
        let store = InMemoryIssueStore::seeded();
        assert_eq!(store.list().await.len(), 10);

        let issue = IssueReport::submit(IssueCategory::Sanitation, REPORT, None).unwrap();
        let id = issue.id.clone();
        store.insert(issue).await.unwrap();
        assert_eq!(store.list().await[0].id, id);

        let updated = store.update_status(&id, IssueStatus::InProgress).await.unwrap();
        assert_eq!(updated.status, IssueStatus::InProgress);
        let err = store.update_status(&id, IssueStatus::New).await.unwrap_err();
        assert!(matches!(err, CivisError::Validation(_)));

        let assigned = store.assign_department(&id, Department::Sanitation).await.unwrap();
        assert_eq!(assigned.department, Some(Department::Sanitation));
    }

    #[tokio::test]
    async fn missing_issue_is_not_found() {
        let store = InMemoryIssueStore::new();
        assert!(matches!(store.get("CIV-404").await, Err(CivisError::NotFound(_))));
        assert!(matches!(store.update_summary("CIV-404", "x").await, Err(CivisError::NotFound(_))));
    }
}
