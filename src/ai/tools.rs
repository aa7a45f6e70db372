//! The four flows exposed to the chat model as callable tools.

use super::client::{ToolCall, ToolDeclaration};
use super::flows::{FlowDefinition, FlowSet};
use super::schema::{self, SchemaSpec};
use super::schema_utils;
use crate::core::types::{
    InsightsInput, InsightsOutput, PredictDemandInput, PredictDemandOutput, PrioritizeInput, PrioritizeOutput,
    SummarizeInput, SummarizeOutput,
};
use crate::error::CivisError;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Summarize,
    Prioritize,
    PredictDemand,
    GenerateInsights,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Summarize(SummarizeInput),
    Prioritize(PrioritizeInput),
    PredictDemand(PredictDemandInput),
    GenerateInsights(InsightsInput),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Summarize(SummarizeOutput),
    Prioritize(PrioritizeOutput),
    PredictDemand(PredictDemandOutput),
    GenerateInsights(InsightsOutput),
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: SchemaSpec,
    pub kind: ToolKind,
}

impl ToolSpec {
    fn from_flow(flow: &FlowDefinition, description: &'static str, kind: ToolKind) -> Self {
        Self { name: flow.name, description, input_schema: flow.input.clone(), kind }
    }

    pub fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: self.input_schema.to_api_schema(),
        }
    }

    /// Coerces and validates raw model arguments into the typed input.
    pub fn parse_input(&self, args: &Value) -> Result<ToolInput, CivisError> {
        let args = schema_utils::coerce(args.clone(), &self.input_schema);
        schema::validate(&args, &self.input_schema)?;
        Ok(match self.kind {
            ToolKind::Summarize => ToolInput::Summarize(serde_json::from_value(args)?),
            ToolKind::Prioritize => ToolInput::Prioritize(serde_json::from_value(args)?),
            ToolKind::PredictDemand => ToolInput::PredictDemand(serde_json::from_value(args)?),
            ToolKind::GenerateInsights => ToolInput::GenerateInsights(serde_json::from_value(args)?),
        })
    }
}

/// Built once at startup; read-only afterwards.
pub struct ToolCatalog {
    flows: Arc<FlowSet>,
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    pub fn new(flows: Arc<FlowSet>) -> Self {
        let specs = vec![
            ToolSpec::from_flow(
                flows.summarize_definition(),
                "Summarizes a single citizen issue report into a one-sentence summary, key details and a suggested action.",
                ToolKind::Summarize,
            ),
            ToolSpec::from_flow(
                flows.prioritize_definition(),
                "Analyzes and prioritizes a single citizen issue, returning a 1-100 priority score and the responsible department.",
                ToolKind::Prioritize,
            ),
            ToolSpec::from_flow(
                flows.predict_demand_definition(),
                "Predicts future service demand based on historical data and current issues.",
                ToolKind::PredictDemand,
            ),
            ToolSpec::from_flow(
                flows.insights_definition(),
                "Generates proactive governance insights from citizen feedback and historical data.",
                ToolKind::GenerateInsights,
            ),
        ];
        Self { flows, specs }
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.specs.iter().map(ToolSpec::declaration).collect()
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, CivisError> {
        let spec = self.get(&call.name).ok_or_else(|| CivisError::ToolExecution {
            tool: call.name.clone(),
            reason: "unknown tool".into(),
        })?;

        Ok(match spec.parse_input(&call.args)? {
            ToolInput::Summarize(i) => ToolOutput::Summarize(self.flows.summarize(&i).await?),
            ToolInput::Prioritize(i) => ToolOutput::Prioritize(self.flows.prioritize(&i).await?),
            ToolInput::PredictDemand(i) => ToolOutput::PredictDemand(self.flows.predict_demand(&i).await?),
            ToolInput::GenerateInsights(i) => ToolOutput::GenerateInsights(self.flows.generate_insights(&i).await?),
        })
    }
}

/// Payload fed back to the model after a tool ran (or failed to).
pub fn result_payload(outcome: &Result<ToolOutput, CivisError>) -> Value {
    match outcome {
        Ok(output) => serde_json::to_value(output).unwrap_or_else(|e| json!({ "error": e.to_string() })),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::GenerationClient;
    use crate::ai::mock::ScriptedService;
    use crate::core::types::{Department, IssueCategory};
    use std::time::Duration;

    fn catalog(service: &Arc<ScriptedService>) -> ToolCatalog {
        let client = GenerationClient::new(service.clone(), Duration::from_secs(5));
        ToolCatalog::new(Arc::new(FlowSet::new(client, "m").unwrap()))
    }

    #[test]
    fn exposes_all_four_flows() {
        let service = Arc::new(ScriptedService::new());
        let names: Vec<String> = catalog(&service).declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["summarizeCitizenIssue", "prioritizeCitizenIssue", "predictServiceDemand", "generateGovernanceInsights"]
        );
    }

    #[test]
    fn parses_loose_category_spelling() {
        let service = Arc::new(ScriptedService::new());
        let catalog = catalog(&service);
        let spec = catalog.get("prioritizeCitizenIssue").unwrap();
        let input = spec
            .parse_input(&json!({ "reportText": "Large pothole on Main St", "category": "road maintenance" }))
            .unwrap();
        assert_eq!(
            input,
            ToolInput::Prioritize(PrioritizeInput {
                report_text: "Large pothole on Main St".into(),
                category: IssueCategory::RoadMaintenance,
            })
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_an_execution_error() {
        let service = Arc::new(ScriptedService::new());
        let call = ToolCall { name: "deleteAllIssues".into(), args: json!({}), thought_signature: None };
        let err = catalog(&service).execute(&call).await.unwrap_err();
        assert!(matches!(err, CivisError::ToolExecution { .. }));
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn executes_flow_and_serializes_result() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "priorityScore": 70,
            "suggestedDepartment": "Road Maintenance",
            "reasoning": "Traffic hazard."
        }));
        let call = ToolCall {
            name: "prioritizeCitizenIssue".into(),
            args: json!({ "reportText": "Large pothole on Main St", "category": "Road Maintenance" }),
            thought_signature: None,
        };
        let outcome = catalog(&service).execute(&call).await;
        match &outcome {
            Ok(ToolOutput::Prioritize(out)) => assert_eq!(out.suggested_department, Department::RoadMaintenance),
            other => panic!("unexpected outcome {other:?}"),
        }
        let payload = result_payload(&outcome);
        assert_eq!(payload["priorityScore"], 70);
    }

    #[test]
    fn errors_become_error_payloads() {
        let outcome: Result<ToolOutput, CivisError> = Err(CivisError::ToolExecution { tool: "x".into(), reason: "boom".into() });
        assert!(result_payload(&outcome)["error"].as_str().unwrap().contains("boom"));
    }
}
