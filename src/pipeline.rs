//! Batch scoring loop
//!
//! Reads NDJSON transactions, scores them on a bounded number of tokio
//! tasks and writes one result line per input line. Results are written
//! in completion order.

use crate::config::AppConfig;
use crate::consumer::{RawTransaction, TransactionReader};
use crate::error::ValidationError;
use crate::metrics::{PipelineMetrics, PredictionLogEntry};
use crate::models::inference::RiskScorer;
use crate::producer::{OutputRecord, Rejection, ResultWriter, ScoredLine};
use crate::types::response::ScoredTransaction;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// Counts reported when the input is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub processed: u64,
    pub rejected: u64,
    pub alerts: u64,
}

#[derive(Default)]
struct Counters {
    processed: AtomicU64,
    rejected: AtomicU64,
    alerts: AtomicU64,
}

/// Scores a stream of transactions with bounded parallelism
pub struct Pipeline {
    scorer: Arc<RiskScorer>,
    metrics: Arc<PipelineMetrics>,
    config: Arc<AppConfig>,
}

impl Pipeline {
    pub fn new(scorer: Arc<RiskScorer>, metrics: Arc<PipelineMetrics>, config: Arc<AppConfig>) -> Self {
        Self {
            scorer,
            metrics,
            config,
        }
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Score every transaction from `reader` and write results to `writer`.
    ///
    /// Rejected lines are reported in the output and do not stop the run.
    /// Returns once every result has been written and flushed.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<PipelineSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let workers = self.config.pipeline.workers.max(1);
        let (tx, mut rx) = mpsc::channel::<OutputRecord>(workers * 2);

        let writer_task = tokio::spawn(async move {
            let mut out = ResultWriter::new(writer);
            while let Some(record) = rx.recv().await {
                out.write(&record).await?;
            }
            out.finish().await.map(|_| ())
        });

        // Semaphore to limit concurrent scoring
        let semaphore = Arc::new(Semaphore::new(workers));
        let counters = Arc::new(Counters::default());
        let mut reader = TransactionReader::new(reader);

        info!(workers, "Scoring transactions");

        let read_result: Result<()> = async {
            while let Some(raw) = reader.next_transaction().await? {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .context("Worker semaphore closed")?;

                let scorer = self.scorer.clone();
                let metrics = self.metrics.clone();
                let config = self.config.clone();
                let counters = counters.clone();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let record = score_line(&raw, &scorer, &metrics, &config, &counters);
                    if tx.send(record).await.is_err() {
                        warn!(line = raw.line, "Result writer stopped, dropping result");
                    }
                    drop(permit);
                });
            }
            Ok(())
        }
        .await;

        // The writer finishes once every task has dropped its sender, so
        // results already scored are flushed even when reading failed
        drop(tx);
        let write_result = writer_task.await.context("Result writer task failed")?;
        if let Err(e) = &read_result {
            warn!(lines = reader.lines_read(), error = %e, "Input aborted");
        }
        read_result?;
        write_result?;

        let summary = PipelineSummary {
            processed: counters.processed.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            alerts: counters.alerts.load(Ordering::Relaxed),
        };
        info!(
            lines = reader.lines_read(),
            processed = summary.processed,
            rejected = summary.rejected,
            alerts = summary.alerts,
            "Input exhausted"
        );
        Ok(summary)
    }
}

fn score_line(
    raw: &RawTransaction,
    scorer: &RiskScorer,
    metrics: &PipelineMetrics,
    config: &AppConfig,
    counters: &Counters,
) -> OutputRecord {
    let start_time = Instant::now();

    let scored = raw.decode().and_then(|input| {
        let record = input.into_record(scorer.clock())?;
        let prediction = scorer.score(&record)?;
        Ok::<_, ValidationError>((record, prediction))
    });

    let (record, prediction) = match scored {
        Ok(scored) => scored,
        Err(e) => {
            warn!(line = raw.line, error = %e, "Rejected transaction");
            metrics.record_rejection();
            counters.rejected.fetch_add(1, Ordering::Relaxed);
            return OutputRecord::Rejected(Rejection::new(raw.line, &e));
        }
    };

    let processing_time = start_time.elapsed();
    let result = ScoredTransaction::new(
        &record,
        prediction,
        &config.detection.risk_levels,
        processing_time,
    );
    let now = scorer.clock().now();

    metrics.record_prediction(PredictionLogEntry {
        timestamp: now,
        transaction_id: record.transaction_id.clone(),
        user_id: record.user_id.clone(),
        amount: record.amount,
        risk_score: result.prediction.risk_score,
        fraud_label: result.prediction.fraud_label,
        supervised_prob: result.prediction.supervised_prob,
        anomaly_flag: result.prediction.anomaly_flag,
        latency_ms: result.latency_ms,
    });
    counters.processed.fetch_add(1, Ordering::Relaxed);

    if let Some(alert) = result.to_alert(&record, now) {
        metrics.record_alert(alert.risk_level);
        counters.alerts.fetch_add(1, Ordering::Relaxed);
        info!(
            alert_id = %alert.alert_id,
            transaction_id = %alert.transaction_id,
            user_id = %alert.user_id,
            amount = alert.amount,
            risk_score = alert.risk_score,
            risk_level = %alert.risk_level,
            triggered_features = ?alert.triggered_features,
            processing_time_us = processing_time.as_micros(),
            "Fraud alert raised"
        );
    } else {
        debug!(
            transaction_id = %record.transaction_id,
            risk_score = result.prediction.risk_score,
            processing_time_us = processing_time.as_micros(),
            "Transaction processed (below threshold)"
        );
    }

    OutputRecord::Scored(Box::new(ScoredLine {
        line: raw.line,
        result,
    }))
}
