//! Concurrent insert benchmark for relational databases.
//!
//! A run bootstraps a pooled connection to the database under test, then
//! floods it with single-row inserts from a fixed set of workers while every
//! request is timed and every failure counted in a Prometheus registry.

#[cfg(feature = "exporter")]
pub mod api;
pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod metrics;

pub use backend::{Backend, BackendError, BackendResult, BootstrapError, Database};
pub use config::{BenchmarkConfig, ConnectionParameters, Engine};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use metrics::{MetricsRegistry, Operation};
