use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use tickscope_core::DatasetSchema;
use tickscope_core::derive::{build_daily_priority_counts, build_person_counts};
use tickscope_core::filter::{
    DimensionId, FilterConfig, FilterEntry, FilterKind, FilterRegistry, FilterState, evaluate,
};

use generators::*;

fn config() -> FilterConfig {
    FilterConfig {
        filters: vec![
            FilterEntry::new("Person", FilterKind::Categorical),
            FilterEntry::new("Status", FilterKind::Categorical),
            FilterEntry::new("Created Date", FilterKind::DateRange),
        ],
    }
}

fn expected_contributions(tickets: &[TicketSpec], person: &str) -> usize {
    tickets
        .iter()
        .filter(|t| t.assignee != Some(person))
        .filter(|t| t.history.iter().any(|a| *a == Some(person)))
        .count()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn person_counts_match_definition(tickets in arb_tickets()) {
        let ds = dataset_of(&tickets);
        let table = build_person_counts(&ds, &DatasetSchema::default()).expect("person counts");

        let mut seen = HashSet::new();
        for row in table.rows() {
            prop_assert!(seen.insert(row.person.clone()), "{} listed twice", row.person);
            let assigned = tickets.iter().filter(|t| t.assignee == Some(row.person.as_str())).count();
            prop_assert_eq!(row.assignee_count, assigned);
            prop_assert_eq!(row.contributor_count, expected_contributions(&tickets, &row.person));
            prop_assert!(row.assignee_count + row.contributor_count > 0);
        }

        for person in PEOPLE {
            let involved = tickets.iter().any(|t| t.assignee == Some(*person))
                || expected_contributions(&tickets, person) > 0;
            prop_assert_eq!(table.get(person).is_some(), involved);
        }
    }

    #[test]
    fn person_counts_are_ordered(tickets in arb_tickets()) {
        let ds = dataset_of(&tickets);
        let table = build_person_counts(&ds, &DatasetSchema::default()).expect("person counts");
        for pair in table.rows().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.assignee_count > b.assignee_count
                    || (a.assignee_count == b.assignee_count && a.person > b.person)
            );
        }
    }

    #[test]
    fn daily_counts_cover_known_priorities(tickets in arb_tickets()) {
        let ds = dataset_of(&tickets);
        let schema = DatasetSchema::default();
        let first = build_daily_priority_counts(&ds, &schema).expect("daily");
        let second = build_daily_priority_counts(&ds, &schema).expect("daily");
        prop_assert_eq!(&first, &second);

        let known = tickets
            .iter()
            .filter(|t| matches!(t.priority, "Highest" | "High" | "Medium" | "Low"))
            .count();
        let counted: usize = first.rows().iter().map(|r| r.count).sum();
        prop_assert_eq!(counted, known);
    }

    #[test]
    fn empty_selections_keep_every_row(tickets in arb_tickets()) {
        let ds = dataset_of(&tickets);
        let registry = FilterRegistry::build(&config(), &ds, &DatasetSchema::default()).expect("registry");
        let outcome = evaluate(&ds, &registry, &FilterState::unrestricted(&registry));
        prop_assert_eq!(outcome.rows, (0..tickets.len()).collect::<Vec<_>>());
    }

    #[test]
    fn categorical_results_respect_selection(
        tickets in arb_tickets(),
        statuses in prop::collection::btree_set(prop::sample::select(STATUSES), 1..3),
        people in prop::collection::btree_set(prop::sample::select(PEOPLE), 1..3),
    ) {
        let ds = dataset_of(&tickets);
        let registry = FilterRegistry::build(&config(), &ds, &DatasetSchema::default()).expect("registry");
        let mut state = FilterState::unrestricted(&registry);
        let status_id = DimensionId::from_column("Status");
        let person_id = DimensionId::from_column("Person");
        for s in &statuses {
            state.toggle(&status_id, s).expect("toggle status");
        }
        for p in &people {
            state.toggle(&person_id, p).expect("toggle person");
        }

        let outcome = evaluate(&ds, &registry, &state);
        let person_fell_back = outcome.fallbacks.contains(&person_id);
        for &row in &outcome.rows {
            let t = &tickets[row];
            prop_assert!(statuses.contains(t.status));
            if !person_fell_back {
                let involved: BTreeSet<&str> =
                    t.assignee.into_iter().chain(t.history.iter().flatten().copied()).collect();
                prop_assert!(people.iter().any(|p| involved.contains(p)));
            }
        }

        // Intersection of single-dimension results.
        let only = |id: &DimensionId| {
            let mut single = FilterState::unrestricted(&registry);
            single
                .set(id, state.get(id).expect("selection").clone())
                .expect("set");
            evaluate(&ds, &registry, &single).rows.into_iter().collect::<BTreeSet<_>>()
        };
        let expected: Vec<usize> = only(&status_id).intersection(&only(&person_id)).copied().collect();
        prop_assert_eq!(outcome.rows, expected);
    }
}
