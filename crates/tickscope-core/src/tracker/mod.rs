//! Pulling tickets straight from the issue tracker.
//!
//! The HTTP transport lives behind [`TrackerClient`] so the pagination and
//! flattening logic here stays synchronous, pure, and testable with an
//! in-memory client.

pub mod flatten;
pub mod issue;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Dataset;
use crate::error::ErrorCode;

pub use flatten::{FlattenOptions, flatten_issue, format_elapsed};
pub use issue::{Issue, SearchResponse};

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("tracker request failed: {0}")]
    Request(String),

    #[error("tracker response invalid: {0}")]
    InvalidResponse(String),
}

impl TrackerError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Request(_) => ErrorCode::TrackerRequestFailed,
            Self::InvalidResponse(_) => ErrorCode::TrackerResponseInvalid,
        }
    }
}

/// A custom field copied into its own column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    /// Column name in the flattened dataset.
    pub name: String,
    /// Tracker field id, e.g. `customfield_10065`.
    pub id: String,
}

/// The stock custom-field mapping for defect exports.
#[must_use]
pub fn default_custom_fields() -> Vec<CustomField> {
    [
        ("Environment", "customfield_10065"),
        ("Root Cause", "customfield_10063"),
        ("Severity", "customfield_10072"),
    ]
    .into_iter()
    .map(|(name, id)| CustomField {
        name: name.to_string(),
        id: id.to_string(),
    })
    .collect()
}

/// Blocking access to the tracker's search endpoint.
pub trait TrackerClient {
    /// Number of issues matching `jql`.
    ///
    /// # Errors
    ///
    /// Transport or decoding failures.
    fn total(&self, jql: &str) -> Result<usize, TrackerError>;

    /// One page of issues, changelogs included.
    ///
    /// # Errors
    ///
    /// Transport or decoding failures.
    fn page(&self, jql: &str, start_at: usize, max_results: usize)
    -> Result<Vec<Issue>, TrackerError>;
}

/// Fetch every issue matching `jql` page by page and flatten each into a
/// row. The result is a raw table; run it through
/// [`ingest::finalize`](crate::ingest::finalize) before filtering.
///
/// # Errors
///
/// The first [`TrackerError`] from the client or the flattener.
pub fn fetch_dataset(
    client: &dyn TrackerClient,
    jql: &str,
    page_size: usize,
    options: &FlattenOptions,
) -> Result<Dataset, TrackerError> {
    let page_size = page_size.max(1);
    let total = client.total(jql)?;
    let pages = total.div_ceil(page_size);
    info!(total, pages, page_size, "fetching tracker issues");

    let mut records = Vec::with_capacity(total);
    for page in 0..pages {
        let start_at = page * page_size;
        tracing::debug!(page = page + 1, start_at, "fetching page");
        let issues = client.page(jql, start_at, page_size)?;
        for issue in &issues {
            records.push(flatten_issue(issue, options)?);
        }
    }

    Ok(Dataset::from_records(records))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::Utc;

    use super::*;
    use crate::dataset::Cell;

    struct FakeTracker {
        issues: Vec<Issue>,
        calls: RefCell<Vec<(usize, usize)>>,
    }

    impl FakeTracker {
        fn with_issues(n: usize) -> Self {
            let issues = (0..n)
                .map(|i| {
                    serde_json::from_value(serde_json::json!({
                        "key": format!("UAT-{i}"),
                        "fields": {
                            "created": "2024-02-01T09:00:00.000+0000",
                            "priority": {"name": "Low"}
                        }
                    }))
                    .expect("issue json")
                })
                .collect();
            Self {
                issues,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TrackerClient for FakeTracker {
        fn total(&self, _jql: &str) -> Result<usize, TrackerError> {
            Ok(self.issues.len())
        }

        fn page(
            &self,
            _jql: &str,
            start_at: usize,
            max_results: usize,
        ) -> Result<Vec<Issue>, TrackerError> {
            self.calls.borrow_mut().push((start_at, max_results));
            Ok(self
                .issues
                .iter()
                .skip(start_at)
                .take(max_results)
                .cloned()
                .collect())
        }
    }

    fn options() -> FlattenOptions {
        FlattenOptions {
            custom_fields: default_custom_fields(),
            history_cap: 76,
            now: Utc::now(),
        }
    }

    #[test]
    fn paginates_until_total() {
        let tracker = FakeTracker::with_issues(5);
        let ds = fetch_dataset(&tracker, "project = UAT", 2, &options()).expect("fetch");
        assert_eq!(ds.len(), 5);
        assert_eq!(*tracker.calls.borrow(), vec![(0, 2), (2, 2), (4, 2)]);
        assert_eq!(ds.value(4, "JIRA Key"), &Cell::Text("UAT-4".into()));
        assert!(ds.has_column("Severity"));
    }

    #[test]
    fn empty_result_makes_no_page_calls() {
        let tracker = FakeTracker::with_issues(0);
        let ds = fetch_dataset(&tracker, "project = UAT", DEFAULT_PAGE_SIZE, &options())
            .expect("fetch");
        assert!(ds.is_empty());
        assert!(tracker.calls.borrow().is_empty());
    }

    #[test]
    fn client_errors_propagate() {
        struct Down;
        impl TrackerClient for Down {
            fn total(&self, _jql: &str) -> Result<usize, TrackerError> {
                Err(TrackerError::Request("connection refused".into()))
            }
            fn page(&self, _: &str, _: usize, _: usize) -> Result<Vec<Issue>, TrackerError> {
                unreachable!("total fails first")
            }
        }
        let err = fetch_dataset(&Down, "x", 10, &options()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TrackerRequestFailed);
    }
}
