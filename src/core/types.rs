//! Typed input and output records for the four AI flows.
//!
//! The `schemars` attributes here are the single source of truth for each
//! flow's contract: the schema registry derives its `SchemaSpec`s from these
//! types, so a constraint declared here is both sent to the model and
//! enforced on what comes back.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum IssueCategory {
    #[serde(rename = "Road Maintenance")]
    RoadMaintenance,
    #[serde(rename = "Public Safety")]
    PublicSafety,
    #[serde(rename = "Sanitation")]
    Sanitation,
    #[serde(rename = "Parks & Rec")]
    ParksRec,
    #[serde(rename = "Noise Complaint")]
    NoiseComplaint,
    #[serde(rename = "Other")]
    Other,
}

impl IssueCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::RoadMaintenance => "Road Maintenance",
            Self::PublicSafety => "Public Safety",
            Self::Sanitation => "Sanitation",
            Self::ParksRec => "Parks & Rec",
            Self::NoiseComplaint => "Noise Complaint",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Department {
    #[serde(rename = "Sanitation")]
    Sanitation,
    #[serde(rename = "Public Safety")]
    PublicSafety,
    #[serde(rename = "Road Maintenance")]
    RoadMaintenance,
    #[serde(rename = "Parks & Rec")]
    ParksRec,
    #[serde(rename = "Administration")]
    Administration,
}

impl Department {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sanitation => "Sanitation",
            Self::PublicSafety => "Public Safety",
            Self::RoadMaintenance => "Road Maintenance",
            Self::ParksRec => "Parks & Rec",
            Self::Administration => "Administration",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The fixed set of services a demand forecast covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Service {
    Sanitation,
    Roads,
    Safety,
    Parks,
    Admin,
}

impl Service {
    pub const ALL: [Service; 5] = [Self::Sanitation, Self::Roads, Self::Safety, Self::Parks, Self::Admin];
}

// --- Summarize ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeInput {
    #[schemars(description = "The detailed report of the issue submitted by a citizen.", length(min = 1, max = 1000))]
    pub report_text: String,
    #[schemars(description = "The category of the reported issue (e.g., Road Maintenance, Public Safety, Sanitation).")]
    pub category: IssueCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeOutput {
    #[schemars(description = "A concise, one-sentence summary of the citizen-reported issue.", length(min = 1))]
    pub summary: String,
    #[schemars(
        description = "2-3 bullet points extracting the most critical details from the report (e.g., specific locations, times, items).",
        length(min = 2, max = 3),
        inner(length(min = 1))
    )]
    pub key_details: Vec<String>,
    #[schemars(description = "A brief, actionable suggestion for the next step to resolve the issue.", length(min = 1))]
    pub suggested_action: String,
}

// --- Prioritize ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeInput {
    #[schemars(description = "The detailed report of the issue submitted by a citizen.", length(min = 1, max = 1000))]
    pub report_text: String,
    #[schemars(description = "The current category of the reported issue (e.g., Road Maintenance, Public Safety, Sanitation).")]
    pub category: IssueCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeOutput {
    #[schemars(
        description = "A score from 1 (lowest priority) to 100 (critical emergency) based on urgency, impact on public safety, and scale.",
        range(min = 1, max = 100)
    )]
    pub priority_score: u32,
    #[schemars(description = "The city department best suited to handle the issue.")]
    pub suggested_department: Department,
    #[schemars(description = "A brief, one-sentence explanation for the assigned score and department.", length(min = 1))]
    pub reasoning: String,
}

// --- PredictDemand ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictDemandInput {
    #[schemars(description = "Historical issue data, including dates, categories, and summaries.", length(min = 1))]
    pub historical_data: String,
    #[schemars(description = "Summaries of current citizen-reported issues.", length(min = 1))]
    pub current_issue_summaries: String,
    #[schemars(description = "The time horizon for the prediction (e.g., next week, next month).", length(min = 1))]
    pub prediction_horizon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemandForecast {
    #[schemars(description = "One of Sanitation, Roads, Safety, Parks, Admin.")]
    pub service: Service,
    #[schemars(description = "Current volume of service requests.", range(min = 0))]
    pub current_demand: f64,
    #[schemars(description = "Predicted volume of service requests over the horizon.", range(min = 0))]
    pub predicted_demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictDemandOutput {
    #[schemars(description = "Anticipated demand per service. Cover exactly Sanitation, Roads, Safety, Parks and Admin.")]
    pub predicted_demand: Vec<DemandForecast>,
    #[schemars(description = "Concrete recommendations for resource allocation based on predicted demand.", inner(length(min = 1)))]
    pub resource_allocation_recommendations: Vec<String>,
    #[schemars(description = "Potential problem areas based on the analyzed data and summaries.", inner(length(min = 1)))]
    pub potential_problem_areas: Vec<String>,
}

// --- GenerateInsights ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsInput {
    #[schemars(description = "A summary of citizen feedback on various issues.", length(min = 1))]
    pub citizen_feedback_summary: String,
    #[schemars(description = "Historical data on service demand.", length(min = 1))]
    pub historical_demand_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsOutput {
    #[schemars(description = "The single most important proactive insight, in one sentence.", length(min = 1))]
    pub key_insight: String,
    #[schemars(
        description = "2-3 actionable recommendations for policy or public services.",
        length(min = 2, max = 3),
        inner(length(min = 1))
    )]
    pub recommendations: Vec<String>,
    #[schemars(
        description = "2-3 data points from the inputs that support the insight.",
        length(min = 2, max = 3),
        inner(length(min = 1))
    )]
    pub data_points: Vec<String>,
}
