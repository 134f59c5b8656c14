//! Per-person activity: tickets assigned versus tickets contributed to.
//!
//! A contribution is a ticket whose status history names the person while
//! someone else is the assignee. Each (ticket, author) pair counts once no
//! matter how many history slots repeat it.

use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::dataset::Dataset;
use crate::derive::{DeriveError, require};
use crate::model::{TicketColumns, tickets};
use crate::schema::DatasetSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonCountRow {
    pub person: String,
    pub assignee_count: usize,
    pub contributor_count: usize,
}

/// One row per person, busiest assignee first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PersonCountTable {
    rows: Vec<PersonCountRow>,
}

impl PersonCountTable {
    #[must_use]
    pub fn rows(&self) -> &[PersonCountRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, person: &str) -> Option<&PersonCountRow> {
        self.rows.iter().find(|r| r.person == person)
    }
}

#[derive(Default)]
struct Tally {
    assigned: usize,
    contributed: usize,
}

/// Count assigned and contributed tickets per person.
///
/// Ordering: assignee count descending, then person name descending.
///
/// # Errors
///
/// [`DeriveError::MissingColumn`] if the key or assignee column is absent.
pub fn build_person_counts(
    dataset: &Dataset,
    schema: &DatasetSchema,
) -> Result<PersonCountTable, DeriveError> {
    require(dataset, &schema.key_column)?;
    require(dataset, &schema.assignee_column)?;

    let columns = TicketColumns::resolve(dataset, schema);
    let mut tallies: HashMap<Cow<'_, str>, Tally> = HashMap::new();
    let mut seen: HashSet<(Cow<'_, str>, Cow<'_, str>)> = HashSet::new();

    for (row, ticket) in tickets(dataset, &columns).enumerate() {
        let assignee = ticket.assignee();
        if let Some(name) = &assignee {
            tallies.entry(name.clone()).or_default().assigned += 1;
        }

        // Keyless rows still dedupe within themselves.
        let ticket_id = ticket
            .key()
            .unwrap_or_else(|| Cow::Owned(format!("\u{0}row:{row}")));

        for author in ticket.history_authors() {
            if !seen.insert((ticket_id.clone(), author.clone())) {
                continue;
            }
            if assignee.as_deref() == Some(author.as_ref()) {
                continue;
            }
            tallies.entry(author).or_default().contributed += 1;
        }
    }

    let mut rows: Vec<PersonCountRow> = tallies
        .into_iter()
        .map(|(person, tally)| PersonCountRow {
            person: person.into_owned(),
            assignee_count: tally.assigned,
            contributor_count: tally.contributed,
        })
        .collect();
    rows.sort_by(|a, b| {
        (Reverse(a.assignee_count), Reverse(&a.person))
            .cmp(&(Reverse(b.assignee_count), Reverse(&b.person)))
    });

    tracing::debug!(people = rows.len(), "built person counts");
    Ok(PersonCountTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    fn ticket(key: &str, assignee: &str, history: &[&str]) -> Vec<(String, Cell)> {
        let mut record = vec![
            ("JIRA Key".to_string(), Cell::from(key)),
            ("Assignee".to_string(), Cell::from(assignee)),
        ];
        for (i, author) in history.iter().enumerate() {
            record.push((format!("Changed By {i}"), Cell::from(*author)));
        }
        record
    }

    fn counts(records: Vec<Vec<(String, Cell)>>) -> PersonCountTable {
        build_person_counts(&Dataset::from_records(records), &DatasetSchema::default())
            .expect("person counts")
    }

    fn row(person: &str, assigned: usize, contributed: usize) -> PersonCountRow {
        PersonCountRow {
            person: person.to_string(),
            assignee_count: assigned,
            contributor_count: contributed,
        }
    }

    #[test]
    fn assignees_and_contributors_are_outer_joined() {
        let table = counts(vec![
            ticket("T1", "Alice", &["Bob"]),
            ticket("T2", "Bob", &["Bob"]),
            ticket("T3", "Alice", &[]),
        ]);
        assert_eq!(table.rows(), [row("Alice", 2, 0), row("Bob", 1, 1)]);
    }

    #[test]
    fn repeated_author_counts_once_per_ticket() {
        let table = counts(vec![ticket("T1", "Alice", &["Carol", "Dan", "Carol"])]);
        assert_eq!(table.get("Carol"), Some(&row("Carol", 0, 1)));
        assert_eq!(table.get("Dan"), Some(&row("Dan", 0, 1)));
    }

    #[test]
    fn unassigned_ticket_still_credits_contributors() {
        let table = counts(vec![ticket("T1", "", &["Erin"])]);
        assert_eq!(table.rows(), [row("Erin", 0, 1)]);
    }

    #[test]
    fn ties_break_by_name_descending() {
        let table = counts(vec![
            ticket("T1", "Amy", &[]),
            ticket("T2", "Zoe", &[]),
            ticket("T3", "Max", &["Amy"]),
            ticket("T4", "Max", &[]),
        ]);
        let order: Vec<_> = table.rows().iter().map(|r| r.person.as_str()).collect();
        assert_eq!(order, ["Max", "Zoe", "Amy"]);
    }

    #[test]
    fn missing_assignee_column_is_an_error() {
        let ds = Dataset::from_records(vec![vec![("JIRA Key".to_string(), Cell::from("T1"))]]);
        let err = build_person_counts(&ds, &DatasetSchema::default()).unwrap_err();
        assert_eq!(err, DeriveError::MissingColumn("Assignee".into()));
    }
}
