use super::client::{GenerationClient, GenerationRequest};
use super::prompts;
use super::schema::{self, SchemaSpec};
use super::template::PromptTemplate;
use crate::core::types::{
    InsightsInput, InsightsOutput, PredictDemandInput, PredictDemandOutput, PrioritizeInput, PrioritizeOutput,
    SummarizeInput, SummarizeOutput,
};
use crate::error::{CivisError, GenerationError};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;

const SCHEMA_VERSION: u32 = 1;

/// Schema pair plus template for one structured-generation operation.
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub name: &'static str,
    pub input: SchemaSpec,
    pub output: SchemaSpec,
    pub template: PromptTemplate,
}

impl FlowDefinition {
    pub fn new<I: JsonSchema, O: JsonSchema>(name: &'static str, template: PromptTemplate) -> Result<Self, CivisError> {
        let input = SchemaSpec::derive::<I>(&format!("{name}Input"), SCHEMA_VERSION)?;
        let output = SchemaSpec::derive::<O>(&format!("{name}Output"), SCHEMA_VERSION)?;
        template.check_against(&input)?;
        Ok(Self { name, input, output, template })
    }

    /// Renders the final instruction: template body followed by the output
    /// contract the model must satisfy.
    pub fn render(&self, input: &serde_json::Value) -> Result<String, CivisError> {
        let body = self.template.render(input)?;
        Ok(format!("{}\n\nREQUIRED OUTPUT FIELDS:\n{}", body, self.output.describe()))
    }
}

/// The four AI flows. Holds only immutable definitions and a client handle,
/// so one instance can serve any number of concurrent callers.
pub struct FlowSet {
    client: GenerationClient,
    model: String,
    summarize: FlowDefinition,
    prioritize: FlowDefinition,
    predict_demand: FlowDefinition,
    insights: FlowDefinition,
}

impl FlowSet {
    pub fn new(client: GenerationClient, model: &str) -> Result<Self, CivisError> {
        Ok(Self {
            client,
            model: model.to_string(),
            summarize: FlowDefinition::new::<SummarizeInput, SummarizeOutput>("summarizeCitizenIssue", prompts::SUMMARIZE)?,
            prioritize: FlowDefinition::new::<PrioritizeInput, PrioritizeOutput>("prioritizeCitizenIssue", prompts::PRIORITIZE)?,
            predict_demand: FlowDefinition::new::<PredictDemandInput, PredictDemandOutput>(
                "predictServiceDemand",
                prompts::PREDICT_DEMAND,
            )?,
            insights: FlowDefinition::new::<InsightsInput, InsightsOutput>(
                "generateGovernanceInsights",
                prompts::GENERATE_INSIGHTS,
            )?,
        })
    }

    pub fn summarize_definition(&self) -> &FlowDefinition {
        &self.summarize
    }

    pub fn prioritize_definition(&self) -> &FlowDefinition {
        &self.prioritize
    }

    pub fn predict_demand_definition(&self) -> &FlowDefinition {
        &self.predict_demand
    }

    pub fn insights_definition(&self) -> &FlowDefinition {
        &self.insights
    }

    pub async fn summarize(&self, input: &SummarizeInput) -> Result<SummarizeOutput, CivisError> {
        self.run(&self.summarize, input).await
    }

    pub async fn prioritize(&self, input: &PrioritizeInput) -> Result<PrioritizeOutput, CivisError> {
        self.run(&self.prioritize, input).await
    }

    pub async fn predict_demand(&self, input: &PredictDemandInput) -> Result<PredictDemandOutput, CivisError> {
        self.run(&self.predict_demand, input).await
    }

    pub async fn generate_insights(&self, input: &InsightsInput) -> Result<InsightsOutput, CivisError> {
        self.run(&self.insights, input).await
    }

    async fn run<I, O>(&self, flow: &FlowDefinition, input: &I) -> Result<O, CivisError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input_val = serde_json::to_value(input)?;
        schema::validate(&input_val, &flow.input)?;

        let prompt = flow.render(&input_val)?;
        log::info!("🧠 Running flow {}", flow.name);

        let request = GenerationRequest::structured(&self.model, prompt, flow.output.clone());
        let result = self.client.generate(request).await.inspect_err(|e| {
            log::error!("Flow {} failed: {}", flow.name, e);
        })?;

        let value = result
            .structured
            .ok_or_else(|| GenerationError::schema_mismatch(format!("{} returned no structured output", flow.name)))?;

        serde_json::from_value(value).map_err(|e| {
            CivisError::Generation(GenerationError::schema_mismatch(format!("{} output parse failed: {}", flow.name, e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::ScriptedService;
    use crate::core::types::{Department, IssueCategory, Service};
    use crate::error::GenerationErrorKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    const POTHOLE: &str = "Large pothole on the corner of Main St and 2nd Ave, causing traffic issues and risk of tire damage to vehicles daily.";

    fn flows(service: &Arc<ScriptedService>) -> FlowSet {
        let client = GenerationClient::new(service.clone(), Duration::from_secs(5));
        FlowSet::new(client, "gemini-2.5-flash").unwrap()
    }

    fn pothole() -> PrioritizeInput {
        PrioritizeInput { report_text: POTHOLE.into(), category: IssueCategory::RoadMaintenance }
    }

    #[tokio::test]
    async fn summarize_returns_key_details() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "summary": "Pothole at Main St and 2nd Ave is disrupting traffic.",
            "keyDetails": ["Corner of Main St and 2nd Ave", "Risk of tire damage", "Occurs daily"],
            "suggestedAction": "Dispatch a road repair crew."
        }));
        let out = flows(&service)
            .summarize(&SummarizeInput { report_text: POTHOLE.into(), category: IssueCategory::RoadMaintenance })
            .await
            .unwrap();
        assert!(!out.summary.is_empty());
        assert!((2..=3).contains(&out.key_details.len()));

        let prompt = match &service.requests()[0].contents[0].parts[0] {
            crate::ai::client::Part::Text(t) => t.clone(),
            other => panic!("unexpected part {other:?}"),
        };
        assert!(prompt.contains("Issue Category: Road Maintenance"));
        assert!(prompt.contains(POTHOLE));
        assert!(prompt.contains("REQUIRED OUTPUT FIELDS"));
    }

    #[tokio::test]
    async fn summarize_rejects_blank_key_details() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "summary": "Pothole at Main St and 2nd Ave is disrupting traffic.",
            "keyDetails": ["", ""],
            "suggestedAction": "Dispatch a road repair crew."
        }));
        let err = flows(&service)
            .summarize(&SummarizeInput { report_text: POTHOLE.into(), category: IssueCategory::RoadMaintenance })
            .await
            .unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::SchemaMismatch));
        let violation = err.violation().unwrap();
        assert_eq!(violation.field, "keyDetails[0]");
        assert_eq!(violation.constraint, "minLength 1");
    }

    #[tokio::test]
    async fn oversized_report_never_reaches_the_model() {
        let service = Arc::new(ScriptedService::new());
        let input = SummarizeInput { report_text: "x".repeat(1001), category: IssueCategory::Other };
        let err = flows(&service).summarize(&input).await.unwrap_err();
        let violation = err.violation().unwrap();
        assert_eq!(violation.field, "reportText");
        assert_eq!(violation.constraint, "maxLength 1000");
        assert!(matches!(err, CivisError::Validation(_)));
        assert!(service.requests().is_empty());

        let at_limit = SummarizeInput { report_text: "x".repeat(1000), category: IssueCategory::Other };
        service.push_json(json!({
            "summary": "Long report.",
            "keyDetails": ["One", "Two"],
            "suggestedAction": "Review it."
        }));
        assert!(flows(&service).summarize(&at_limit).await.is_ok());
    }

    #[tokio::test]
    async fn prioritize_accepts_in_range_score() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "priorityScore": 72,
            "suggestedDepartment": "Road Maintenance",
            "reasoning": "A daily traffic hazard that can damage vehicles."
        }));
        let out = flows(&service).prioritize(&pothole()).await.unwrap();
        assert_eq!(out.priority_score, 72);
        assert_eq!(out.suggested_department, Department::RoadMaintenance);
    }

    #[tokio::test]
    async fn prioritize_rejects_out_of_range_score() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "priorityScore": 0,
            "suggestedDepartment": "Road Maintenance",
            "reasoning": "Minor."
        }));
        let err = flows(&service).prioritize(&pothole()).await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::SchemaMismatch));
        assert_eq!(err.violation().unwrap().field, "priorityScore");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_model() {
        let service = Arc::new(ScriptedService::new());
        let input = PrioritizeInput { report_text: "   ".into(), category: IssueCategory::Other };
        let err = flows(&service).prioritize(&input).await.unwrap_err();
        assert!(matches!(err, CivisError::Validation(_)));
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn predict_demand_parses_stringified_forecast() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "predictedDemand": "[{\"service\":\"Sanitation\",\"currentDemand\":110,\"predictedDemand\":150},{\"service\":\"Roads\",\"currentDemand\":130,\"predictedDemand\":120}]",
            "resourceAllocationRecommendations": ["Increase sanitation patrols downtown by 20%."],
            "potentialProblemAreas": ["Overflowing bins in the downtown core."]
        }));
        let out = flows(&service)
            .predict_demand(&PredictDemandInput {
                historical_data: "15% rise in sanitation requests over six months.".into(),
                current_issue_summaries: "Overflowing bins; pothole repairs.".into(),
                prediction_horizon: "next month".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.predicted_demand.len(), 2);
        assert_eq!(out.predicted_demand[0].service, Service::Sanitation);
        assert_eq!(out.predicted_demand[0].predicted_demand, 150.0);
    }

    #[tokio::test]
    async fn predict_demand_rejects_unlisted_service() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "predictedDemand": [{ "service": "Libraries", "currentDemand": 5, "predictedDemand": 9 }],
            "resourceAllocationRecommendations": [],
            "potentialProblemAreas": []
        }));
        let err = flows(&service)
            .predict_demand(&PredictDemandInput {
                historical_data: "h".into(),
                current_issue_summaries: "c".into(),
                prediction_horizon: "next week".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.violation().unwrap().field, "predictedDemand[0].service");
    }

    #[tokio::test]
    async fn insights_require_two_to_three_recommendations() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "keyInsight": "Noise and parking complaints cluster around the new commercial complex.",
            "recommendations": ["Increase patrols at peak hours", "Review parking regulations"],
            "dataPoints": ["30% rise in safety calls", "Repeated illegal parking reports"]
        }));
        let out = flows(&service)
            .generate_insights(&InsightsInput {
                citizen_feedback_summary: "Increased noise complaints around the new commercial complex.".into(),
                historical_demand_data: "Spike in public safety calls by 30%.".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_identical_calls_do_not_interfere() {
        let service = Arc::new(ScriptedService::new());
        let answer = json!({
            "priorityScore": 55,
            "suggestedDepartment": "Road Maintenance",
            "reasoning": "Moderate traffic impact."
        });
        service.push_json(answer.clone());
        service.push_json(answer);
        let flows = flows(&service);
        let input = pothole();
        let (a, b) = tokio::join!(flows.prioritize(&input), flows.prioritize(&input));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(service.requests().len(), 2);
        assert_eq!(input, pothole());
    }
}
