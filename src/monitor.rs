//! Slow-query timing shared by both adapters.
//!
//! Latency is measured after the fact; a slow backend call is never
//! interrupted, it only produces a log line.

use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::error::Result;

/// Latency classification of a finished query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLatency {
    /// Below the slow threshold.
    Normal,
    /// Above the slow threshold.
    Slow,
    /// Above the very slow threshold.
    VerySlow,
}

/// Times backend calls and logs the slow ones.
#[derive(Debug, Clone, Copy)]
pub struct SlowQueryMonitor {
    slow: Duration,
    very_slow: Duration,
}

impl SlowQueryMonitor {
    /// Create a monitor with explicit thresholds.
    pub fn new(slow: Duration, very_slow: Duration) -> Self {
        SlowQueryMonitor { slow, very_slow }
    }

    /// Create a monitor from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.slow_threshold(), config.very_slow_threshold())
    }

    /// Classify an elapsed time against the thresholds.
    pub fn classify(&self, elapsed: Duration) -> QueryLatency {
        if elapsed > self.very_slow {
            QueryLatency::VerySlow
        } else if elapsed > self.slow {
            QueryLatency::Slow
        } else {
            QueryLatency::Normal
        }
    }

    /// Log one finished query and return its classification.
    pub fn record(&self, backend: &str, query: &str, elapsed: Duration) -> QueryLatency {
        let latency = self.classify(elapsed);
        let elapsed_ms = elapsed.as_millis() as u64;
        match latency {
            QueryLatency::VerySlow => {
                error!(backend, elapsed_ms, query, "very slow query");
            }
            QueryLatency::Slow => {
                warn!(backend, elapsed_ms, query, "slow query");
            }
            QueryLatency::Normal => {
                debug!(backend, elapsed_ms, query, "query executed");
            }
        }
        latency
    }

    /// Run `op`, then log its latency whether it succeeded or not.
    pub fn time<T, F>(&self, backend: &str, query: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let start = Instant::now();
        let result = op();
        self.record(backend, query, start.elapsed());
        result
    }
}

impl Default for SlowQueryMonitor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrawlError;

    #[test]
    fn test_classify_default_thresholds() {
        let monitor = SlowQueryMonitor::default();

        assert_eq!(monitor.classify(Duration::from_millis(3)), QueryLatency::Normal);
        assert_eq!(monitor.classify(Duration::from_millis(10)), QueryLatency::Normal);
        assert_eq!(monitor.classify(Duration::from_millis(11)), QueryLatency::Slow);
        assert_eq!(monitor.classify(Duration::from_millis(100)), QueryLatency::Slow);
        assert_eq!(monitor.classify(Duration::from_millis(101)), QueryLatency::VerySlow);
    }

    #[test]
    fn test_time_passes_result_through() {
        let monitor = SlowQueryMonitor::new(Duration::from_secs(1), Duration::from_secs(2));

        let value = monitor.time("test", "*:*", || Ok(42)).unwrap();
        assert_eq!(value, 42);

        let err = monitor
            .time::<(), _>("test", "*:*", || Err(TrawlError::backend("down")))
            .unwrap_err();
        assert!(matches!(err, TrawlError::BackendUnavailable(_)));
    }

    #[test]
    fn test_record_slow() {
        let monitor = SlowQueryMonitor::new(Duration::ZERO, Duration::from_secs(60));
        let latency = monitor.record("fulltext", "a:1", Duration::from_millis(5));
        assert_eq!(latency, QueryLatency::Slow);
    }
}
