//! AI orchestration for a citizen-issue intake and triage dashboard.
//!
//! Four structured-generation flows (summarize, prioritize, predict demand,
//! governance insights) sit on a single [`ai::client::GenerationClient`], and
//! a [`agent::ChatAgent`] exposes them to the model as tools.

pub mod config;
pub mod error;

pub mod core {
    pub mod conversation;
    pub mod issue;
    pub mod stats;
    pub mod types;
}

pub mod ai {
    pub mod client;
    pub mod flows;
    pub mod gemini;
    pub mod mock;
    pub mod prompts;
    pub mod schema;
    pub mod schema_utils;
    pub mod speech;
    pub mod template;
    pub mod tools;
}

pub mod agent;
pub mod triage;
