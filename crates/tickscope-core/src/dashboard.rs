//! One user's view over one dataset.
//!
//! A [`Session`] owns the dataset, the filter registry built from it, and
//! the current selections. Every interaction either replaces the dataset
//! (which rebuilds the registry and clears selections) or edits a
//! selection; [`Session::snapshot`] then recomputes everything the
//! dashboard shows from scratch.

use serde::Serialize;

use crate::chart::{ChartSpec, daily_priority_chart, person_counts_chart, render_or_placeholder};
use crate::dataset::Dataset;
use crate::derive::{
    DailyPriorityTable, DeriveError, PersonCountTable, build_daily_priority_counts,
    build_person_counts,
};
use crate::filter::{
    ConfigError, DimensionId, FilterConfig, FilterOutcome, FilterRegistry, FilterState, evaluate,
};
use crate::schema::DatasetSchema;

/// Everything the dashboard renders for the current selections.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub total_rows: usize,
    pub filtered: FilterOutcome,
    #[serde(skip)]
    pub dataset: Dataset,
    pub daily: Option<DailyPriorityTable>,
    pub people: Option<PersonCountTable>,
    pub daily_chart: ChartSpec,
    pub people_chart: ChartSpec,
}

impl Snapshot {
    /// Dimensions that fell back to unrestricted.
    #[must_use]
    pub fn fallbacks(&self) -> &[DimensionId] {
        &self.filtered.fallbacks
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    schema: DatasetSchema,
    config: FilterConfig,
    dataset: Dataset,
    registry: FilterRegistry,
    state: FilterState,
}

impl Session {
    /// Start a session over `dataset`.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from building the filter registry.
    pub fn new(
        schema: DatasetSchema,
        config: FilterConfig,
        dataset: Dataset,
    ) -> Result<Self, ConfigError> {
        let registry = FilterRegistry::build(&config, &dataset, &schema)?;
        let state = FilterState::unrestricted(&registry);
        Ok(Self {
            schema,
            config,
            dataset,
            registry,
            state,
        })
    }

    /// Replace the dataset, rebuilding the registry and resetting every
    /// selection. On error the session is left unchanged.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from building the filter registry.
    pub fn load(&mut self, dataset: Dataset) -> Result<(), ConfigError> {
        let registry = FilterRegistry::build(&self.config, &dataset, &self.schema)?;
        self.state = FilterState::unrestricted(&registry);
        self.registry = registry;
        self.dataset = dataset;
        tracing::info!(rows = self.dataset.len(), "dataset loaded, selections reset");
        Ok(())
    }

    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub const fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    pub const fn state_mut(&mut self) -> &mut FilterState {
        &mut self.state
    }

    #[must_use]
    pub const fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Filter, aggregate, and chart the current dataset.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let filtered = evaluate(&self.dataset, &self.registry, &self.state);
        let dataset = filtered.apply(&self.dataset);

        let daily = build_daily_priority_counts(&dataset, &self.schema);
        let people = build_person_counts(&dataset, &self.schema);
        let daily_chart = render_or_placeholder("daily", daily.clone(), daily_priority_chart);
        let people_chart = render_or_placeholder("people", people.clone(), person_counts_chart);

        Snapshot {
            total_rows: self.dataset.len(),
            filtered,
            dataset,
            daily: daily.ok(),
            people: people.ok(),
            daily_chart,
            people_chart,
        }
    }
}

/// Shorthand for callers that only need the derived tables.
///
/// # Errors
///
/// The first [`DeriveError`] from either builder.
pub fn derive_tables(
    dataset: &Dataset,
    schema: &DatasetSchema,
) -> Result<(DailyPriorityTable, PersonCountTable), DeriveError> {
    Ok((
        build_daily_priority_counts(dataset, schema)?,
        build_person_counts(dataset, schema)?,
    ))
}
