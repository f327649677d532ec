//! Request latency and error accounting
//!
//! One [`MetricsRegistry`] exists per process. It is built before any backend
//! and handed to every backend as an `Arc`, so all engines share the same
//! label namespace:
//!
//! - `database_request_duration_seconds{query="add"|"get"}`: latency of
//!   successful calls
//! - `database_error_requests{method="add"|"get"}`: failed calls
//!
//! ```no_run
//! use db_benchmark::metrics::{MetricsRegistry, Operation};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let metrics = MetricsRegistry::new()?;
//! let result: Result<(), std::io::Error> = metrics.instrument(Operation::Add, async { Ok(()) }).await;
//! println!("{}", metrics.render()?);
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder, linear_buckets,
};

const DURATION_METRIC: &str = "database_request_duration_seconds";
const ERROR_METRIC: &str = "database_error_requests";

/// Histogram buckets: 10ms, 30ms, ... in 20ms steps
const BUCKET_START: f64 = 0.01;
const BUCKET_WIDTH: f64 = 0.02;
const BUCKET_COUNT: usize = 75;

/// Logical operation a measurement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single row insert
    Add,
    /// Primary key lookup
    Get,
}

impl Operation {
    /// Stable label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Get => "get",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to register benchmark metrics: {0}")]
    Registration(#[source] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(#[source] prometheus::Error),
}

/// Duration histogram and error counter shared by every backend
#[derive(Debug)]
pub struct MetricsRegistry {
    registry: Registry,
    request_duration: HistogramVec,
    error_requests: IntCounterVec,
}

impl MetricsRegistry {
    /// Build a registry owning both instruments
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Register both instruments in `registry`.
    ///
    /// Fails if the registry already carries them, which keeps a process from
    /// ending up with two sets of counters.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let buckets = linear_buckets(BUCKET_START, BUCKET_WIDTH, BUCKET_COUNT)
            .map_err(MetricsError::Registration)?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                DURATION_METRIC,
                "Histogram for the runtime of benchmark database requests.",
            )
            .buckets(buckets),
            &["query"],
        )
        .map_err(MetricsError::Registration)?;

        let error_requests = IntCounterVec::new(
            Opts::new(ERROR_METRIC, "The total number of failed requests"),
            &["method"],
        )
        .map_err(MetricsError::Registration)?;

        registry
            .register(Box::new(request_duration.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(error_requests.clone()))
            .map_err(MetricsError::Registration)?;

        Ok(Self {
            registry,
            request_duration,
            error_requests,
        })
    }

    /// Run `operation`, recording its latency on success or one error on failure
    pub async fn instrument<T, E, F>(&self, op: Operation, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let timer = self
            .request_duration
            .with_label_values(&[op.as_str()])
            .start_timer();

        match operation.await {
            Ok(value) => {
                timer.observe_duration();
                Ok(value)
            }
            Err(err) => {
                timer.stop_and_discard();
                self.error_requests.with_label_values(&[op.as_str()]).inc();
                Err(err)
            }
        }
    }

    /// Number of latency observations recorded for `op`
    pub fn observations(&self, op: Operation) -> u64 {
        self.request_duration
            .with_label_values(&[op.as_str()])
            .get_sample_count()
    }

    /// Number of failures recorded for `op`
    pub fn errors(&self, op: Operation) -> u64 {
        self.error_requests.with_label_values(&[op.as_str()]).get()
    }

    /// Prometheus text exposition of everything in the registry
    pub fn render(&self) -> Result<String, MetricsError> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(MetricsError::Encoding)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
