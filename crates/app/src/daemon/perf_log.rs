use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::crypto::MutualDerivation;
use common::metrics::{MetricsSink, OperationMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    KeyGeneration,
    KeyExchange,
    Encryption,
    Decryption,
}

/// One timed operation; times are in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub operation: String,
    pub kind: OperationKind,
    pub total_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_in: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_out: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_operations: usize,
    pub key_generation_count: usize,
    pub key_exchange_count: usize,
    pub encryption_count: usize,
    pub decryption_count: usize,
    pub average_key_generation_time: f64,
    pub average_key_exchange_time: f64,
    pub average_encryption_time: f64,
    pub average_decryption_time: f64,
}

/// Append-only record of the operations run in this session
#[derive(Debug, Clone, Default)]
pub struct PerformanceLog {
    entries: Vec<PerformanceEntry>,
}

impl PerformanceLog {
    pub fn entries(&self) -> &[PerformanceEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn record_key_generation(&mut self, initiator: Duration, responder: Duration) {
        self.entries.push(PerformanceEntry {
            operation: "Key Generation".to_string(),
            kind: OperationKind::KeyGeneration,
            total_time: (initiator + responder).as_secs_f64(),
            initiator_time: Some(initiator.as_secs_f64()),
            responder_time: Some(responder.as_secs_f64()),
            bytes_in: None,
            bytes_out: None,
            timestamp: Utc::now(),
        });
    }

    pub fn record_key_exchange(&mut self, derivation: &MutualDerivation) {
        self.entries.push(PerformanceEntry {
            operation: "Key Exchange (ECDH + HKDF)".to_string(),
            kind: OperationKind::KeyExchange,
            total_time: derivation.total().as_secs_f64(),
            initiator_time: Some(derivation.initiator.total().as_secs_f64()),
            responder_time: Some(derivation.responder.total().as_secs_f64()),
            bytes_in: None,
            bytes_out: None,
            timestamp: Utc::now(),
        });
    }

    pub fn statistics(&self) -> Statistics {
        let summary = |kind: OperationKind| {
            let times: Vec<f64> = self
                .entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.total_time)
                .collect();
            let average = if times.is_empty() {
                0.0
            } else {
                times.iter().sum::<f64>() / times.len() as f64
            };
            (times.len(), average)
        };

        let (key_generation_count, average_key_generation_time) =
            summary(OperationKind::KeyGeneration);
        let (key_exchange_count, average_key_exchange_time) = summary(OperationKind::KeyExchange);
        let (encryption_count, average_encryption_time) = summary(OperationKind::Encryption);
        let (decryption_count, average_decryption_time) = summary(OperationKind::Decryption);

        Statistics {
            total_operations: self.entries.len(),
            key_generation_count,
            key_exchange_count,
            encryption_count,
            decryption_count,
            average_key_generation_time,
            average_key_exchange_time,
            average_encryption_time,
            average_decryption_time,
        }
    }
}

/// Cipher metrics arrive as `"encrypt <algorithm>"` / `"decrypt <algorithm>"`
impl MetricsSink for PerformanceLog {
    fn record(&mut self, metrics: &OperationMetrics) {
        let (kind, operation) = match metrics.operation.split_once(' ') {
            Some(("encrypt", algorithm)) => (
                OperationKind::Encryption,
                format!("File Encryption ({})", algorithm),
            ),
            Some(("decrypt", algorithm)) => (
                OperationKind::Decryption,
                format!("File Decryption ({})", algorithm),
            ),
            _ => {
                tracing::warn!(operation = %metrics.operation, "unrecognized operation metrics");
                return;
            }
        };

        self.entries.push(PerformanceEntry {
            operation,
            kind,
            total_time: metrics.elapsed_secs(),
            initiator_time: None,
            responder_time: None,
            bytes_in: Some(metrics.bytes_in),
            bytes_out: Some(metrics.bytes_out),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_statistics() {
        let log = PerformanceLog::default();
        assert_eq!(log.statistics(), Statistics::default());
    }

    #[test]
    fn test_statistics_by_kind() {
        let mut log = PerformanceLog::default();
        log.record_key_generation(Duration::from_millis(10), Duration::from_millis(30));
        log.record_key_generation(Duration::from_millis(20), Duration::from_millis(20));
        log.record(&OperationMetrics::new(
            "encrypt AES-192-GCM",
            Duration::from_millis(4),
            100,
            100,
        ));
        log.record(&OperationMetrics::new(
            "decrypt AES-192-CBC",
            Duration::from_millis(2),
            112,
            100,
        ));

        let stats = log.statistics();
        assert_eq!(stats.total_operations, 4);
        assert_eq!(stats.key_generation_count, 2);
        assert_eq!(stats.key_exchange_count, 0);
        assert_eq!(stats.encryption_count, 1);
        assert_eq!(stats.decryption_count, 1);
        assert!((stats.average_key_generation_time - 0.04).abs() < 1e-9);
        assert!((stats.average_encryption_time - 0.004).abs() < 1e-9);
        assert_eq!(stats.average_key_exchange_time, 0.0);

        assert_eq!(log.entries()[2].operation, "File Encryption (AES-192-GCM)");
        assert_eq!(log.entries()[3].bytes_in, Some(112));
    }

    #[test]
    fn test_unknown_metrics_ignored() {
        let mut log = PerformanceLog::default();
        log.record(&OperationMetrics::new("sign", Duration::ZERO, 0, 0));
        assert!(log.entries().is_empty());
    }
}
