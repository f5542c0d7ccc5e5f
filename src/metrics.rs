//! Operation metrics.
//!
//! Keeps a bounded ring of the most recent operation samples and derives
//! aggregates from whatever is currently in the buffer. Eviction is purely
//! count-based; old samples fall out when the ring is full.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MetricSample {
    pub operation: String,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub cache_hit: bool,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(operation: impl Into<String>, duration: Duration, cache_hit: bool) -> Self {
        Self {
            operation: operation.into(),
            duration,
            cache_hit,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSummary {
    pub total_operations: usize,
    pub average_response_time_ms: f64,
    pub cache_hit_rate: f64,
    pub operation_counts: BTreeMap<String, usize>,
}

/// Bounded ring of operation samples with aggregate queries.
///
/// Not internally synchronized; the owning service wraps it in a `Mutex`.
#[derive(Debug)]
pub struct MetricsCollector {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl MetricsCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, sample: MetricSample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples for one operation, or all samples when `operation` is None.
    pub fn metrics(&self, operation: Option<&str>) -> Vec<MetricSample> {
        self.samples
            .iter()
            .filter(|s| operation.map_or(true, |name| s.operation == name))
            .cloned()
            .collect()
    }

    pub fn average_response_time(&self, operation: Option<&str>) -> Duration {
        let matching: Vec<&MetricSample> = self
            .samples
            .iter()
            .filter(|s| operation.map_or(true, |name| s.operation == name))
            .collect();
        if matching.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = matching.iter().map(|s| s.duration).sum();
        total / matching.len() as u32
    }

    pub fn cache_hit_rate(&self, operation: Option<&str>) -> f64 {
        let mut total = 0usize;
        let mut hits = 0usize;
        for sample in &self.samples {
            if operation.map_or(true, |name| sample.operation == name) {
                total += 1;
                if sample.cache_hit {
                    hits += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn operation_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.operation.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_operations: self.samples.len(),
            average_response_time_ms: self.average_response_time(None).as_secs_f64() * 1000.0,
            cache_hit_rate: self.cache_hit_rate(None),
            operation_counts: self.operation_counts(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(d.as_millis())
    }
}
