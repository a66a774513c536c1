use std::time::Duration;

/// Timing and size report for a single cryptographic operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationMetrics {
    pub operation: String,
    pub elapsed: Duration,
    pub bytes_in: usize,
    pub bytes_out: usize,
}

impl OperationMetrics {
    pub fn new(
        operation: impl Into<String>,
        elapsed: Duration,
        bytes_in: usize,
        bytes_out: usize,
    ) -> Self {
        Self {
            operation: operation.into(),
            elapsed,
            bytes_in,
            bytes_out,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Anything that collects [`OperationMetrics`]
pub trait MetricsSink {
    fn record(&mut self, metrics: &OperationMetrics);
}

impl MetricsSink for Vec<OperationMetrics> {
    fn record(&mut self, metrics: &OperationMetrics) {
        self.push(metrics.clone());
    }
}
