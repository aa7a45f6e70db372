//! `{{field}}` substitution for flow prompts.

use super::schema::SchemaSpec;
use crate::error::CivisError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        let mut rest = self.text;
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else { break };
            let name = after[..close].trim();
            if !name.is_empty() && !found.contains(&name) {
                found.push(name);
            }
            rest = &after[close + 2..];
        }
        found
    }

    /// Fails if any placeholder has no matching field in `schema`. Run once
    /// when flows are built so a bad template never reaches a request.
    pub fn check_against(&self, schema: &SchemaSpec) -> Result<(), CivisError> {
        match self.placeholders().into_iter().find(|p| schema.field(p).is_none()) {
            Some(missing) => Err(CivisError::Config(format!(
                "template '{}' references '{{{{{missing}}}}}' which is not a field of {}",
                self.name, schema.name
            ))),
            None => Ok(()),
        }
    }

    pub fn render(&self, input: &Value) -> Result<String, CivisError> {
        let fields = input
            .as_object()
            .ok_or_else(|| CivisError::Config(format!("template '{}' rendered with a non-object input", self.name)))?;

        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text;
        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let name = after[..close].trim();
            let value = fields.get(name).ok_or_else(|| {
                CivisError::Config(format!("template '{}' has no value for '{name}'", self.name))
            })?;
            match value {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
            rest = &after[close + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SummarizeInput;
    use serde_json::json;

    const T: PromptTemplate = PromptTemplate::new("t", "Category: {{category}}\nReport: {{ reportText }}\nAgain: {{category}}");

    #[test]
    fn renders_every_placeholder() {
        let out = T
            .render(&json!({ "category": "Sanitation", "reportText": "Bins overflowing.", "extra": 1 }))
            .unwrap();
        assert_eq!(out, "Category: Sanitation\nReport: Bins overflowing.\nAgain: Sanitation");
    }

    #[test]
    fn lists_placeholders_once() {
        assert_eq!(T.placeholders(), vec!["category", "reportText"]);
    }

    #[test]
    fn missing_field_is_a_config_error() {
        let err = T.render(&json!({ "category": "Sanitation" })).unwrap_err();
        assert!(matches!(err, CivisError::Config(_)));
    }

    #[test]
    fn checks_placeholders_against_schema() {
        let schema = SchemaSpec::derive::<SummarizeInput>("SummarizeInput", 1).unwrap();
        assert!(T.check_against(&schema).is_ok());
        let bad = PromptTemplate::new("bad", "{{issueReport}}");
        assert!(matches!(bad.check_against(&schema), Err(CivisError::Config(_))));
    }
}
