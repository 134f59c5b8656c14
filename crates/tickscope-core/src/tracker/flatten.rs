//! One issue, one row.
//!
//! Status changes become numbered column groups (`Old Status 0`,
//! `Changed By 0`, ...) in chronological order, which is the shape the
//! derived tables and the `Person` dimension read.

use chrono::{DateTime, FixedOffset, Utc};

use crate::dataset::Cell;
use crate::dates::TRACKER_DATE_FORMAT;
use crate::tracker::issue::{History, Issue};
use crate::tracker::{CustomField, TrackerError};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Inputs that are not part of the issue itself.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub custom_fields: Vec<CustomField>,
    /// Status-change groups kept per issue; later events are dropped.
    pub history_cap: usize,
    /// Reference instant for `Total Elapsed Time`.
    pub now: DateTime<Utc>,
}

/// `"{d} days, {h} hours, {m} minutes, {s} seconds"`, leaving out the day
/// part when it is zero. Negative durations clamp to zero.
#[must_use]
pub fn format_elapsed(total_seconds: i64) -> String {
    let mut rest = total_seconds.max(0);
    let days = rest / SECONDS_PER_DAY;
    rest %= SECONDS_PER_DAY;
    let hours = rest / SECONDS_PER_HOUR;
    rest %= SECONDS_PER_HOUR;
    let minutes = rest / SECONDS_PER_MINUTE;
    let seconds = rest % SECONDS_PER_MINUTE;

    let clock = format!("{hours} hours, {minutes} minutes, {seconds} seconds");
    if days > 0 {
        format!("{days} days, {clock}")
    } else {
        clock
    }
}

/// Parse a tracker timestamp (`2024-01-15T14:30:00.000+0000` or RFC 3339).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

fn tracker_format(ts: &DateTime<FixedOffset>) -> String {
    ts.naive_local().format(TRACKER_DATE_FORMAT).to_string()
}

#[allow(clippy::cast_precision_loss)]
fn hours_between(from: &DateTime<FixedOffset>, to: &DateTime<FixedOffset>) -> f64 {
    (*to - *from).num_milliseconds() as f64 / 3_600_000.0
}

struct StatusChange<'a> {
    at: DateTime<FixedOffset>,
    history: &'a History,
    from: Option<&'a str>,
    to: Option<&'a str>,
}

fn status_changes(issue: &Issue) -> Vec<StatusChange<'_>> {
    let Some(changelog) = &issue.changelog else {
        return Vec::new();
    };
    let mut changes: Vec<StatusChange<'_>> = changelog
        .histories
        .iter()
        .filter_map(|history| parse_timestamp(&history.created).map(|at| (at, history)))
        .flat_map(|(at, history)| {
            history
                .items
                .iter()
                .filter(|item| item.field == "status")
                .map(move |item| StatusChange {
                    at,
                    history,
                    from: item.from_text.as_deref(),
                    to: item.to_text.as_deref(),
                })
        })
        .collect();
    // The API lists newest first; the sort is stable so same-instant items
    // keep their changelog order.
    changes.sort_by_key(|c| c.at);
    changes
}

/// Flatten one issue into `(column, value)` pairs.
///
/// # Errors
///
/// [`TrackerError::InvalidResponse`] if the creation timestamp does not
/// parse.
pub fn flatten_issue(
    issue: &Issue,
    options: &FlattenOptions,
) -> Result<Vec<(String, Cell)>, TrackerError> {
    let fields = &issue.fields;
    let created = parse_timestamp(&fields.created).ok_or_else(|| {
        TrackerError::InvalidResponse(format!(
            "issue {} has unparseable created timestamp '{}'",
            issue.key, fields.created
        ))
    })?;

    let text = |value: Option<&str>| Cell::from(value.map(str::to_string));
    let mut record = vec![
        ("JIRA Key".to_string(), Cell::from(issue.key.as_str())),
        (
            "Display Name".to_string(),
            text(fields.reporter.as_ref().map(|u| u.display_name.as_str())),
        ),
        ("Created Date".to_string(), Cell::from(tracker_format(&created))),
        ("Details".to_string(), text(fields.summary.as_deref())),
        (
            "Priority".to_string(),
            text(fields.priority.as_ref().map(|p| p.name.as_str())),
        ),
        (
            "Resolution".to_string(),
            text(fields.resolution.as_ref().map(|r| r.name.as_str())),
        ),
        (
            "Assignee".to_string(),
            text(fields.assignee.as_ref().map(|u| u.display_name.as_str())),
        ),
        (
            "Status".to_string(),
            text(fields.status.as_ref().map(|s| s.name.as_str())),
        ),
    ];
    for custom in &options.custom_fields {
        record.push((custom.name.clone(), Cell::from(fields.custom_text(&custom.id))));
    }
    record.push((
        "Total Elapsed Time".to_string(),
        Cell::Text(format_elapsed(
            (options.now - created.with_timezone(&Utc)).num_seconds(),
        )),
    ));

    let changes = status_changes(issue);
    if changes.len() > options.history_cap {
        tracing::debug!(
            key = %issue.key,
            events = changes.len(),
            cap = options.history_cap,
            "status history truncated"
        );
    }

    let mut previous = created;
    for (i, change) in changes.iter().take(options.history_cap).enumerate() {
        record.extend([
            (
                format!("Time In Status {i}"),
                Cell::Number(hours_between(&previous, &change.at)),
            ),
            (format!("Old Status {i}"), text(change.from)),
            (format!("New Status {i}"), text(change.to)),
            (
                format!("Changed By {i}"),
                text(change.history.author.as_ref().map(|u| u.display_name.as_str())),
            ),
            (format!("Changed Date {i}"), Cell::from(tracker_format(&change.at))),
        ]);
        previous = change.at;
    }

    Ok(record)
}
