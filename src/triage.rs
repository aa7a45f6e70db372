use crate::ai::flows::FlowSet;
use crate::core::issue::{IssueReport, IssueStore};
use crate::core::types::{PrioritizeInput, PrioritizeOutput, SummarizeInput, SummarizeOutput};
use crate::error::CivisError;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TriageReport {
    pub issue: IssueReport,
    pub summary: SummarizeOutput,
    pub priority: PrioritizeOutput,
}

/// Runs the staff-side AI analysis for a stored issue and records the
/// results on it.
pub struct TriageService {
    flows: Arc<FlowSet>,
    store: Arc<dyn IssueStore>,
}

impl TriageService {
    pub fn new(flows: Arc<FlowSet>, store: Arc<dyn IssueStore>) -> Self {
        Self { flows, store }
    }

    pub async fn triage(&self, id: &str) -> Result<TriageReport, CivisError> {
        let issue = self.store.get(id).await?;
        log::info!("🩺 Triaging {} ({})", issue.id, issue.category);

        let summarize_input = SummarizeInput { report_text: issue.report_text.clone(), category: issue.category };
        let prioritize_input = PrioritizeInput { report_text: issue.report_text.clone(), category: issue.category };

        let (summary, priority) = tokio::join!(
            self.flows.summarize(&summarize_input),
            self.flows.prioritize(&prioritize_input)
        );
        let (summary, priority) = (summary?, priority?);

        self.store.update_summary(id, &summary.summary).await?;
        let issue = self.store.assign_department(id, priority.suggested_department).await?;
        log::info!(
            "   -> {} scored {} for {}",
            issue.id,
            priority.priority_score,
            priority.suggested_department
        );

        Ok(TriageReport { issue, summary, priority })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::{GenerationClient, GenerationRequest, GenerationResult, ModelService};
    use crate::core::issue::InMemoryIssueStore;
    use crate::core::types::Department;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Answers by flow, since the two concurrent calls may arrive in any order.
    struct ByFlow;

    #[async_trait]
    impl ModelService for ByFlow {
        async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
            let schema = request.output_schema.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
            Ok(GenerationResult::structured(match schema {
                "summarizeCitizenIssueOutput" => json!({
                    "summary": "Trash can on Oak Ave has been overflowing for days.",
                    "keyDetails": ["Oak Ave", "Not collected for days"],
                    "suggestedAction": "Schedule an immediate pickup."
                }),
                _ => json!({
                    "priorityScore": 45,
                    "suggestedDepartment": "Sanitation",
                    "reasoning": "Health nuisance with limited scale."
                }),
            }))
        }
    }

    #[tokio::test]
    async fn triage_records_summary_and_department() {
        let client = GenerationClient::new(Arc::new(ByFlow), Duration::from_secs(5));
        let flows = Arc::new(FlowSet::new(client, "m").unwrap());
        let store: Arc<dyn IssueStore> = Arc::new(InMemoryIssueStore::seeded());
        let service = TriageService::new(flows, store.clone());

        let report = service.triage("CIV-003").await.unwrap();
        assert_eq!(report.priority.priority_score, 45);
        assert_eq!(report.issue.department, Some(Department::Sanitation));

        let stored = store.get("CIV-003").await.unwrap();
        assert_eq!(stored.summary, "Trash can on Oak Ave has been overflowing for days.");
    }

    #[tokio::test]
    async fn unknown_issue_is_not_found() {
        let client = GenerationClient::new(Arc::new(ByFlow), Duration::from_secs(5));
        let flows = Arc::new(FlowSet::new(client, "m").unwrap());
        let service = TriageService::new(flows, Arc::new(InMemoryIssueStore::new()));
        assert!(matches!(service.triage("CIV-999").await, Err(CivisError::NotFound(_))));
    }
}
