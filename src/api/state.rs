//! Shared exporter state

use std::sync::Arc;

use crate::backend::Backend;
use crate::metrics::MetricsRegistry;

#[derive(Clone)]
pub struct ApiState {
    pub metrics: Arc<MetricsRegistry>,
    pub backend: Arc<dyn Backend>,
}

impl ApiState {
    pub fn new(metrics: Arc<MetricsRegistry>, backend: Arc<dyn Backend>) -> Self {
        Self { metrics, backend }
    }
}
