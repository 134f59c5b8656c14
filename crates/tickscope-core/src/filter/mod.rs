//! Filter configuration, per-dimension definitions, selections, and the
//! evaluator that applies them.

pub mod config;
pub mod definition;
pub mod eval;
pub mod selection;

pub use config::{ConfigError, FilterConfig, FilterEntry, FilterKind};
pub use definition::{Bounds, ColumnRef, DimensionId, FilterDefinition, FilterRegistry};
pub use eval::{DimensionFilter, FilterOutcome, evaluate, filter_dataset};
pub use selection::{
    CategoricalSelection, DateRangeSelection, FilterError, FilterSelection, FilterState,
    NumericRangeSelection,
};
