//! Declarative scrap scripts
//!
//! A script names a site, the inputs it needs and an ordered list of steps. It is
//! validated and resolved against concrete input values before any browser is
//! touched, then replayed by the [`ScriptRunner`] without a proposer.

pub mod placeholder;
pub mod runner;
pub mod store;

pub use runner::{ScriptOutput, ScriptRunner};
pub use store::ScriptStore;

use crate::error::{Result, ScrapError};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

/// A replayable scrap script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    /// URL the session is opened at
    pub site: String,

    /// Required inputs, name to human description
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub input: IndexMap<String, String>,

    pub steps: Vec<Step>,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a URL in the same session
    Navigate { url: String },

    /// Replace the value of an input
    Fill { selector: String, text: String },

    /// Click, then wait for the page to settle
    Click { selector: String },

    Extract(ExtractStep),

    /// Repeat the nested extractions for each match of `selector`
    #[serde(alias = "extract_all")]
    ForEach(ForEachStep),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Navigate { .. } => "navigate",
            Step::Fill { .. } => "fill",
            Step::Click { .. } => "click",
            Step::Extract(_) => "extract",
            Step::ForEach(_) => "for_each",
        }
    }
}

/// Read DOM properties of the first match of `selector`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractStep {
    pub selector: String,

    /// DOM property name to output label, e.g. `{"textContent": "title"}`
    pub properties: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForEachStep {
    pub selector: String,

    /// Header of each block, numbered from 1
    #[serde(default = "default_label")]
    pub label: String,

    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Extractions run inside each match
    #[serde(alias = "forEach")]
    pub steps: Vec<ExtractStep>,
}

fn default_label() -> String {
    "ITEM".to_string()
}

fn default_limit() -> usize {
    50
}

impl Script {
    /// Load a script file. A missing file and malformed JSON are reported differently.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScrapError::ScriptNotFound(path.display().to_string()),
            _ => ScrapError::Io(e),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            ScrapError::InvalidScript(reason) => ScrapError::InvalidScript(format!("{}: {}", path.display(), reason)),
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(content).map_err(|e| ScrapError::InvalidScript(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every placeholder in `site` and `steps` is declared in `input`
    pub fn validate(&self) -> Result<()> {
        if self.site.trim().is_empty() {
            return Err(ScrapError::InvalidScript("'site' is empty".to_string()));
        }

        let mut used = placeholder::collect(&serde_json::Value::String(self.site.clone()));
        used.extend(placeholder::collect(&serde_json::to_value(&self.steps)?));
        let undeclared: Vec<String> = used
            .into_iter()
            .filter(|name| !self.input.contains_key(name))
            .collect();
        if !undeclared.is_empty() {
            return Err(ScrapError::UndeclaredPlaceholder(undeclared));
        }
        Ok(())
    }

    /// Declared inputs without a value, paired with their descriptions
    pub fn missing_inputs(&self, values: &HashMap<String, String>) -> Vec<(String, String)> {
        self.input
            .iter()
            .filter(|(name, _)| !values.contains_key(name.as_str()))
            .map(|(name, description)| (name.clone(), description.clone()))
            .collect()
    }

    /// Validate against `values` and return a copy with every placeholder replaced
    pub fn resolve(&self, values: &HashMap<String, String>) -> Result<Script> {
        self.validate()?;

        let missing = self.missing_inputs(values);
        if !missing.is_empty() {
            return Err(ScrapError::MissingInput { missing });
        }

        // Input descriptions are documentation and stay as written
        let mut steps = serde_json::to_value(&self.steps)?;
        placeholder::substitute(&mut steps, values);
        Ok(Script {
            site: placeholder::substitute_str(&self.site, values),
            input: self.input.clone(),
            steps: serde_json::from_value(steps).map_err(|e| ScrapError::InvalidScript(e.to_string()))?,
        })
    }

    /// JSON schema of the script format
    pub fn schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Script)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r##"{
        "site": "http://ex.test",
        "input": {"q": "search text"},
        "steps": [
            {"action": "fill", "selector": "#q", "text": "{{q}}"},
            {"action": "click", "selector": "#go"},
            {"action": "extract", "selector": "#result", "properties": {"textContent": "text"}}
        ]
    }"##;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json(SEARCH).unwrap();
        assert_eq!(script.site, "http://ex.test");
        assert_eq!(script.input.get("q").map(String::as_str), Some("search text"));
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[0], Step::Fill { selector: "#q".to_string(), text: "{{q}}".to_string() });
        assert_eq!(script.steps[2].name(), "extract");
    }

    #[test]
    fn test_legacy_extract_all_spelling() {
        let script = Script::from_json(
            r#"{"site": "http://ex.test", "steps": [
                {"action": "extract_all", "selector": "article", "label": "book", "limit": 3,
                 "forEach": [{"action": "extract", "selector": "h3 a", "properties": {"title": "title"}}]}
            ]}"#,
        )
        .unwrap();

        match &script.steps[0] {
            Step::ForEach(step) => {
                assert_eq!(step.label, "book");
                assert_eq!(step.limit, 3);
                assert_eq!(step.steps[0].selector, "h3 a");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_for_each_defaults() {
        let script = Script::from_json(
            r#"{"site": "http://ex.test", "steps": [
                {"action": "for_each", "selector": "li", "steps": [{"selector": "a", "properties": {"href": "link"}}]}
            ]}"#,
        )
        .unwrap();
        match &script.steps[0] {
            Step::ForEach(step) => {
                assert_eq!(step.label, "ITEM");
                assert_eq!(step.limit, 50);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_is_invalid() {
        let err = Script::from_json(r#"{"site": "http://ex.test", "steps": [{"action": "hover", "selector": "a"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScrapError::InvalidScript(_)));
    }

    #[test]
    fn test_undeclared_placeholder() {
        let err = Script::from_json(
            r#"{"site": "http://ex.test/{{lang}}", "steps": [{"action": "click", "selector": "{{button}}"}]}"#,
        )
        .unwrap_err();
        match err {
            ScrapError::UndeclaredPlaceholder(names) => assert_eq!(names, vec!["button", "lang"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_reports_missing_inputs() {
        let script = Script::from_json(SEARCH).unwrap();
        let err = script.resolve(&HashMap::new()).unwrap_err();
        assert_eq!(err.missing_input_report().as_deref(), Some("- q: search text"));
    }

    #[test]
    fn test_resolve_substitutes() {
        let script = Script::from_json(SEARCH).unwrap();
        let resolved = script.resolve(&values(&[("q", "widgets")])).unwrap();
        assert_eq!(resolved.steps[0], Step::Fill { selector: "#q".to_string(), text: "widgets".to_string() });
        assert_eq!(resolved.input, script.input);
    }

    #[test]
    fn test_input_descriptions_may_mention_braces() {
        let script = Script::from_json(
            r#"{"site": "http://ex.test/{{day}}", "input": {"day": "date as {{YYYY-MM-DD}}"},
                "steps": [{"action": "navigate", "url": "http://ex.test/{{day}}/news"}]}"#,
        )
        .unwrap();

        let resolved = script.resolve(&values(&[("day", "2024-05-01")])).unwrap();
        assert_eq!(resolved.site, "http://ex.test/2024-05-01");
        assert_eq!(resolved.steps[0], Step::Navigate { url: "http://ex.test/2024-05-01/news".to_string() });
        assert_eq!(resolved.input.get("day").map(String::as_str), Some("date as {{YYYY-MM-DD}}"));
    }

    #[test]
    fn test_load_errors_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Script::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ScrapError::ScriptNotFound(_)));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(Script::load(&broken).unwrap_err(), ScrapError::InvalidScript(_)));
    }

    #[test]
    fn test_schema_names_actions() {
        let schema = Script::schema().to_string();
        assert!(schema.contains("for_each"));
        assert!(schema.contains("properties"));
    }
}
