//! NDJSON writer for scoring results

use crate::error::ValidationError;
use crate::types::response::ScoredTransaction;
use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::debug;

/// Input line that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub line: usize,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl Rejection {
    pub fn new(line: usize, err: &ValidationError) -> Self {
        Self {
            line,
            error: err.to_string(),
            field: err.field(),
        }
    }
}

/// Scored result tagged with the input line it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLine {
    pub line: usize,
    #[serde(flatten)]
    pub result: ScoredTransaction,
}

/// One output line
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Scored(Box<ScoredLine>),
    Rejected(Rejection),
}

/// Writes one JSON object per line to an async sink
pub struct ResultWriter<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
    written: u64,
}

impl<W: AsyncWrite + Unpin> ResultWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Write a single record followed by a newline
    pub async fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record).context("Failed to serialize result")?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .context("Failed to write result")?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered output and hand back the sink
    pub async fn finish(mut self) -> Result<W> {
        self.writer.flush().await.context("Failed to flush results")?;
        debug!(records = self.written, "Result stream flushed");
        Ok(self.writer.into_inner())
    }

    /// Records written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}
