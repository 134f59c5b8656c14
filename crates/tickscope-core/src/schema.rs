use serde::{Deserialize, Serialize};

/// Maximum number of status-change events kept per ticket.
pub const DEFAULT_HISTORY_CAP: usize = 76;

/// Name of the virtual column spanning the assignee and every history author.
pub const PERSON_COLUMN: &str = "Person";

/// Names of the well-known columns in the canonical dataset.
///
/// Every field can be overridden under `[schema]` in `tickscope.toml`, so
/// exports with renamed headers still map onto the canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default = "default_created_column")]
    pub created_column: String,
    #[serde(default = "default_priority_column")]
    pub priority_column: String,
    #[serde(default = "default_assignee_column")]
    pub assignee_column: String,
    #[serde(default = "default_status_column")]
    pub status_column: String,
    /// Prefix of the history author columns (`"{prefix} {i}"`).
    #[serde(default = "default_changed_by_prefix")]
    pub changed_by_prefix: String,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            created_column: default_created_column(),
            priority_column: default_priority_column(),
            assignee_column: default_assignee_column(),
            status_column: default_status_column(),
            changed_by_prefix: default_changed_by_prefix(),
            history_cap: default_history_cap(),
        }
    }
}

impl DatasetSchema {
    /// Column name of the `index`-th history author slot.
    #[must_use]
    pub fn changed_by_column(&self, index: usize) -> String {
        format!("{} {index}", self.changed_by_prefix)
    }

    /// All history author column names, in slot order.
    #[must_use]
    pub fn changed_by_columns(&self) -> Vec<String> {
        (0..self.history_cap)
            .map(|i| self.changed_by_column(i))
            .collect()
    }

    /// The columns the `Person` composite dimension spans: the assignee
    /// column followed by every history author column.
    #[must_use]
    pub fn person_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.history_cap + 1);
        columns.push(self.assignee_column.clone());
        columns.extend(self.changed_by_columns());
        columns
    }
}

fn default_key_column() -> String {
    "JIRA Key".to_string()
}

fn default_created_column() -> String {
    "Created Date".to_string()
}

fn default_priority_column() -> String {
    "Priority".to_string()
}

fn default_assignee_column() -> String {
    "Assignee".to_string()
}

fn default_status_column() -> String {
    "Status".to_string()
}

fn default_changed_by_prefix() -> String {
    "Changed By".to_string()
}

const fn default_history_cap() -> usize {
    DEFAULT_HISTORY_CAP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_columns_start_with_assignee() {
        let schema = DatasetSchema {
            history_cap: 3,
            ..DatasetSchema::default()
        };
        assert_eq!(
            schema.person_columns(),
            vec!["Assignee", "Changed By 0", "Changed By 1", "Changed By 2"]
        );
    }

    #[test]
    fn default_cap_spans_76_history_slots() {
        let schema = DatasetSchema::default();
        let columns = schema.changed_by_columns();
        assert_eq!(columns.len(), 76);
        assert_eq!(columns.first().map(String::as_str), Some("Changed By 0"));
        assert_eq!(columns.last().map(String::as_str), Some("Changed By 75"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let schema: DatasetSchema =
            toml::from_str("key_column = \"Issue key\"\nhistory_cap = 10\n").expect("parse");
        assert_eq!(schema.key_column, "Issue key");
        assert_eq!(schema.history_cap, 10);
        assert_eq!(schema.assignee_column, "Assignee");
    }
}
