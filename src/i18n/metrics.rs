//! Translation metrics and observability module.
//!
//! Process-wide counters for provider calls and per-language outcomes. The
//! proxy exposes the report over HTTP; the CLI logs it at the end of a run.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Translation metrics counters.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of per-language calls made to a translation provider
    provider_calls: AtomicUsize,

    /// Number of per-language provider calls that failed
    provider_failures: AtomicUsize,

    /// Number of languages for which a translated frame was produced
    languages_materialized: AtomicUsize,

    /// Number of languages skipped because their results were unusable
    languages_suppressed: AtomicUsize,

    /// Number of clones discarded because their structure drifted
    clones_discarded: AtomicUsize,
}

static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// Create a fresh, zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global translation metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::new)
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_language_materialized(&self) {
        self.languages_materialized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_language_suppressed(&self) {
        self.languages_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clone_discarded(&self) {
        self.clones_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn languages_materialized(&self) -> usize {
        self.languages_materialized.load(Ordering::Relaxed)
    }

    pub fn languages_suppressed(&self) -> usize {
        self.languages_suppressed.load(Ordering::Relaxed)
    }

    pub fn clones_discarded(&self) -> usize {
        self.clones_discarded.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            languages_materialized: self.languages_materialized(),
            languages_suppressed: self.languages_suppressed(),
            clones_discarded: self.clones_discarded(),
        }
    }
}

/// Snapshot of the translation counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub provider_calls: usize,
    pub provider_failures: usize,

    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,

    pub languages_materialized: usize,
    pub languages_suppressed: usize,
    pub clones_discarded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_record_provider_call() {
        let metrics = TranslationMetrics::new();

        assert_eq!(metrics.provider_calls(), 0);
        metrics.record_provider_call();
        metrics.record_provider_call();
        assert_eq!(metrics.provider_calls(), 2);
    }

    #[test]
    fn test_record_language_outcomes() {
        let metrics = TranslationMetrics::new();

        metrics.record_language_materialized();
        metrics.record_language_suppressed();
        metrics.record_language_suppressed();
        metrics.record_clone_discarded();

        assert_eq!(metrics.languages_materialized(), 1);
        assert_eq!(metrics.languages_suppressed(), 2);
        assert_eq!(metrics.clones_discarded(), 1);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();

        assert_eq!(report.provider_calls, 0);
        assert_eq!(report.provider_failures, 0);
        assert_eq!(report.provider_success_rate, 0.0);
        assert_eq!(report.languages_materialized, 0);
    }

    #[test]
    fn test_report_provider_success_rate() {
        let metrics = TranslationMetrics::new();

        // 4 calls, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_provider_call();
        }
        metrics.record_provider_failure();

        let report = metrics.report();
        assert_eq!(report.provider_calls, 4);
        assert_eq!(report.provider_failures, 1);
        assert_eq!(report.provider_success_rate, 75.0);
    }

    #[test]
    fn test_report_all_failures() {
        let metrics = TranslationMetrics::new();

        metrics.record_provider_call();
        metrics.record_provider_failure();

        assert_eq!(metrics.report().provider_success_rate, 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(TranslationMetrics::new().report()).expect("serialize");
        assert_eq!(json["provider_calls"], 0);
        assert!(json.get("languages_suppressed").is_some());
    }

    // ==================== Singleton Tests ====================

    #[test]
    fn test_global_returns_same_instance() {
        let metrics1 = TranslationMetrics::global();
        let metrics2 = TranslationMetrics::global();

        assert!(std::ptr::eq(metrics1, metrics2));
    }

    #[test]
    fn test_global_counters_are_monotonic() {
        let metrics = TranslationMetrics::global();
        let initial = metrics.clones_discarded();
        metrics.record_clone_discarded();

        assert!(TranslationMetrics::global().clones_discarded() >= initial + 1);
    }
}
