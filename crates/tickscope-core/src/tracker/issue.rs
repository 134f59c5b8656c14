//! Wire types for the tracker's issue search API (`/rest/api/2/search`
//! with `expand=changelog`). Only the fields the flattener reads are typed;
//! custom fields are kept as raw JSON keyed by field id.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub max_results: usize,
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    pub fields: IssueFields,
    #[serde(default)]
    pub changelog: Option<Changelog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueFields {
    pub created: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reporter: Option<User>,
    #[serde(default)]
    pub priority: Option<Named>,
    #[serde(default)]
    pub resolution: Option<Named>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub status: Option<Named>,
    /// Everything else, including `customfield_*` entries.
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

impl IssueFields {
    /// Display text of a custom field: option objects yield their `value`
    /// (or `name`), plain strings and numbers are used as-is.
    #[must_use]
    pub fn custom_text(&self, field_id: &str) -> Option<String> {
        match self.other.get(field_id)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(map) => map
                .get("value")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<History>,
}

/// One changelog entry: a set of field changes made together.
#[derive(Debug, Clone, Deserialize)]
pub struct History {
    #[serde(default)]
    pub author: Option<User>,
    pub created: String,
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryItem {
    pub field: String,
    #[serde(default, rename = "fromString")]
    pub from_text: Option<String>,
    #[serde(default, rename = "toString")]
    pub to_text: Option<String>,
}
