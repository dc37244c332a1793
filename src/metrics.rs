//! Prediction metrics and statistics tracking.
//!
//! Everything is kept in memory for the lifetime of the process; nothing is
//! written to disk.

use crate::types::alert::RiskLevel;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::info;

/// Alerts listed in a snapshot
const RECENT_ALERTS: usize = 5;

/// Latency samples kept for percentile statistics
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// One scored transaction, as remembered for windowed metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub transaction_id: String,
    pub user_id: String,
    pub amount: f64,
    pub risk_score: f64,
    pub fraud_label: u8,
    pub supervised_prob: f64,
    pub anomaly_flag: u8,
    pub latency_ms: f64,
}

/// High-risk transaction listed in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAlert {
    pub transaction_id: String,
    pub user_id: String,
    pub amount: f64,
    pub risk_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates over the predictions recorded within a time window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub window_seconds: u64,
    pub transactions: u64,
    pub fraud_count: u64,
    /// Percentage of transactions labelled fraud
    pub detection_rate: Option<f64>,
    pub avg_latency_ms: Option<f64>,
    pub avg_risk_score: Option<f64>,
    pub anomaly_count: u64,
    pub throughput_tps: f64,
    pub recent_alerts: Vec<RecentAlert>,
}

/// Metrics collector for scored transactions
pub struct PipelineMetrics {
    /// Total transactions scored
    pub transactions_processed: AtomicU64,
    /// Total alerts generated
    pub alerts_generated: AtomicU64,
    /// Transactions with the anomaly flag set
    pub anomalies_flagged: AtomicU64,
    /// Transactions rejected by validation
    pub transactions_rejected: AtomicU64,
    alerts_by_level: RwLock<HashMap<RiskLevel, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Risk score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Bounded log of recent predictions, oldest first
    entries: RwLock<VecDeque<PredictionLogEntry>>,
    max_entries: usize,
    start_time: Instant,
}

// A panicking writer leaves plain counters behind, which are still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl PipelineMetrics {
    /// Create a new metrics collector keeping at most `max_entries` log entries
    pub fn new(max_entries: usize) -> Self {
        Self {
            transactions_processed: AtomicU64::new(0),
            alerts_generated: AtomicU64::new(0),
            anomalies_flagged: AtomicU64::new(0),
            transactions_rejected: AtomicU64::new(0),
            alerts_by_level: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(1000))),
            max_entries: max_entries.max(1),
            start_time: Instant::now(),
        }
    }

    /// Record a scored transaction
    pub fn record_prediction(&self, entry: PredictionLogEntry) {
        self.transactions_processed.fetch_add(1, Ordering::Relaxed);
        if entry.anomaly_flag == 1 {
            self.anomalies_flagged.fetch_add(1, Ordering::Relaxed);
        }

        {
            let mut times = write(&self.processing_times);
            times.push((entry.latency_ms * 1000.0) as u64);
            // Keep only the most recent samples
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = ((entry.risk_score * 10.0) as usize).min(9);
        write(&self.score_buckets)[bucket] += 1;

        let mut entries = write(&self.entries);
        if entries.len() == self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Record an alert
    pub fn record_alert(&self, risk_level: RiskLevel) {
        self.alerts_generated.fetch_add(1, Ordering::Relaxed);
        *write(&self.alerts_by_level).entry(risk_level).or_insert(0) += 1;
    }

    /// Record a transaction that failed validation
    pub fn record_rejection(&self) {
        self.transactions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn processing_stats(&self) -> ProcessingStats {
        let mut sorted: Vec<u64> = read(&self.processing_times).clone();
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (transactions per second since start)
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get score distribution
    pub fn score_distribution(&self) -> [u64; 10] {
        *read(&self.score_buckets)
    }

    /// Get alerts by risk level
    pub fn alerts_by_level(&self) -> HashMap<RiskLevel, u64> {
        read(&self.alerts_by_level).clone()
    }

    /// Aggregate the predictions recorded in the `window_seconds` before `now`
    pub fn snapshot(&self, window_seconds: u64, now: DateTime<Utc>) -> MetricsSnapshot {
        // A window reaching past the representable range covers every entry
        let cutoff = i64::try_from(window_seconds)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|window| now.checked_sub_signed(window));
        let entries = read(&self.entries);
        let window: Vec<&PredictionLogEntry> = entries
            .iter()
            .filter(|e| cutoff.map_or(true, |cutoff| e.timestamp >= cutoff))
            .collect();

        let total = window.len() as u64;
        let throughput_tps = if window_seconds > 0 {
            total as f64 / window_seconds as f64
        } else {
            0.0
        };

        if total == 0 {
            return MetricsSnapshot {
                window_seconds,
                transactions: 0,
                fraud_count: 0,
                detection_rate: None,
                avg_latency_ms: None,
                avg_risk_score: None,
                anomaly_count: 0,
                throughput_tps,
                recent_alerts: Vec::new(),
            };
        }

        let fraud_count = window.iter().filter(|e| e.fraud_label == 1).count() as u64;
        let anomaly_count = window.iter().filter(|e| e.anomaly_flag == 1).count() as u64;
        let avg_latency = window.iter().map(|e| e.latency_ms).sum::<f64>() / total as f64;
        let avg_risk = window.iter().map(|e| e.risk_score).sum::<f64>() / total as f64;

        let mut by_risk = window.clone();
        by_risk.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        let recent_alerts = by_risk
            .into_iter()
            .take(RECENT_ALERTS)
            .map(|e| RecentAlert {
                transaction_id: e.transaction_id.clone(),
                user_id: e.user_id.clone(),
                amount: e.amount,
                risk_score: e.risk_score,
                timestamp: e.timestamp,
            })
            .collect();

        MetricsSnapshot {
            window_seconds,
            transactions: total,
            fraud_count,
            detection_rate: Some(fraud_count as f64 / total as f64 * 100.0),
            avg_latency_ms: Some(avg_latency),
            avg_risk_score: Some(avg_risk),
            anomaly_count,
            throughput_tps,
            recent_alerts,
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let tx_count = self.transactions_processed.load(Ordering::Relaxed);
        let alert_count = self.alerts_generated.load(Ordering::Relaxed);
        let anomaly_count = self.anomalies_flagged.load(Ordering::Relaxed);
        let rejected = self.transactions_rejected.load(Ordering::Relaxed);
        let alert_rate = if tx_count > 0 {
            (alert_count as f64 / tx_count as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.processing_stats();
        let throughput = self.throughput();
        let score_dist = self.score_distribution();
        let mut alerts_by_level: Vec<(RiskLevel, u64)> = self.alerts_by_level().into_iter().collect();
        alerts_by_level.sort();

        info!("==================== RISK SCORER METRICS ====================");
        info!(
            "Transactions scored: {:>8} | Throughput: {:>8.1} tx/s",
            tx_count, throughput
        );
        info!(
            "Alerts generated:    {:>8} | Alert rate: {:>7.1}%",
            alert_count, alert_rate
        );
        info!(
            "Anomalies flagged:   {:>8} | Rejected:   {:>8}",
            anomaly_count, rejected
        );
        info!(
            "Processing time (us): mean={} p50={} p95={} p99={} max={}",
            processing.mean_us,
            processing.p50_us,
            processing.p95_us,
            processing.p99_us,
            processing.max_us
        );
        for (level, count) in &alerts_by_level {
            let pct = if alert_count > 0 {
                (*count as f64 / alert_count as f64) * 100.0
            } else {
                0.0
            };
            info!("  {:10}: {:>6} ({:>5.1}%)", level.as_str(), count, pct);
        }

        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "#".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("=============================================================");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new(MAX_LATENCY_SAMPLES)
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodically logs the metrics summary
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 11, 12, 0, 0).unwrap()
    }

    fn entry(id: &str, seconds_ago: i64, risk_score: f64, fraud: u8, anomaly: u8) -> PredictionLogEntry {
        PredictionLogEntry {
            timestamp: now() - ChronoDuration::seconds(seconds_ago),
            transaction_id: id.to_string(),
            user_id: format!("user_{id}"),
            amount: 1000.0,
            risk_score,
            fraud_label: fraud,
            supervised_prob: risk_score,
            anomaly_flag: anomaly,
            latency_ms: 0.2,
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new(100);

        metrics.record_prediction(entry("a", 1, 0.07, 0, 0));
        metrics.record_prediction(entry("b", 2, 0.986, 1, 1));
        metrics.record_alert(RiskLevel::Critical);
        metrics.record_rejection();

        assert_eq!(metrics.transactions_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.alerts_generated.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.anomalies_flagged.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.transactions_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.alerts_by_level().get(&RiskLevel::Critical), Some(&1));

        let dist = metrics.score_distribution();
        assert_eq!(dist[0], 1);
        assert_eq!(dist[9], 1);

        let stats = metrics.processing_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_us, 200);
    }

    #[test]
    fn test_empty_snapshot() {
        let metrics = PipelineMetrics::new(100);
        let snapshot = metrics.snapshot(300, now());

        assert_eq!(snapshot.transactions, 0);
        assert_eq!(snapshot.detection_rate, None);
        assert_eq!(snapshot.avg_latency_ms, None);
        assert_eq!(snapshot.throughput_tps, 0.0);
        assert!(snapshot.recent_alerts.is_empty());
    }

    #[test]
    fn test_snapshot_window() {
        let metrics = PipelineMetrics::new(100);
        metrics.record_prediction(entry("old", 600, 0.9, 1, 1));
        metrics.record_prediction(entry("a", 10, 0.07, 0, 0));
        metrics.record_prediction(entry("b", 20, 0.79, 1, 1));
        metrics.record_prediction(entry("c", 30, 0.35, 0, 0));
        metrics.record_prediction(entry("d", 40, 0.25, 0, 0));

        let snapshot = metrics.snapshot(300, now());

        assert_eq!(snapshot.transactions, 4);
        assert_eq!(snapshot.fraud_count, 1);
        assert_eq!(snapshot.anomaly_count, 1);
        assert_eq!(snapshot.detection_rate, Some(25.0));
        assert!((snapshot.avg_risk_score.unwrap() - 0.365).abs() < 1e-9);
        assert!((snapshot.throughput_tps - 4.0 / 300.0).abs() < 1e-12);

        let ids: Vec<&str> = snapshot
            .recent_alerts
            .iter()
            .map(|a| a.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_huge_window_covers_everything() {
        let metrics = PipelineMetrics::new(100);
        metrics.record_prediction(entry("old", 86_400 * 365, 0.9, 1, 1));
        metrics.record_prediction(entry("new", 1, 0.07, 0, 0));

        for window in [u64::MAX, u64::MAX / 2, i64::MAX as u64 / 1000 + 1] {
            let snapshot = metrics.snapshot(window, now());
            assert_eq!(snapshot.transactions, 2);
            assert_eq!(snapshot.window_seconds, window);
        }
    }

    #[test]
    fn test_recent_alerts_capped() {
        let metrics = PipelineMetrics::new(100);
        for i in 0..8 {
            metrics.record_prediction(entry(&format!("t{i}"), 1, i as f64 / 10.0, 0, 0));
        }
        let snapshot = metrics.snapshot(60, now());
        assert_eq!(snapshot.recent_alerts.len(), RECENT_ALERTS);
        assert_eq!(snapshot.recent_alerts[0].transaction_id, "t7");
    }

    #[test]
    fn test_entry_log_is_bounded() {
        let metrics = PipelineMetrics::new(3);
        for i in 0..5 {
            metrics.record_prediction(entry(&format!("t{i}"), 1, 0.1, 0, 0));
        }

        let snapshot = metrics.snapshot(60, now());
        assert_eq!(snapshot.transactions, 3);
        // Counters are not bounded by the log
        assert_eq!(metrics.transactions_processed.load(Ordering::Relaxed), 5);
    }
}
