//! tickscope-core library.
//!
//! Canonical ticket dataset, declarative filters, derived tables, and chart
//! descriptions for issue-tracker dashboards.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern, each mapping to an
//!   [`error::ErrorCode`]; `anyhow::Result` only at the config boundary.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod dates;
pub mod derive;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod model;
pub mod schema;
pub mod tracker;

pub use dashboard::{Session, Snapshot};
pub use dataset::{Cell, Dataset};
pub use schema::DatasetSchema;
