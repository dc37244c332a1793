//! NDJSON reader for incoming transactions

use crate::error::ValidationError;
use crate::types::transaction::TransactionInput;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One non-blank input line, not yet decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    /// 1-based line number in the input stream
    pub line: usize,
    /// Raw bytes of the line, not necessarily valid UTF-8
    pub payload: Vec<u8>,
}

impl RawTransaction {
    /// Decode the line into a transaction input
    pub fn decode(&self) -> Result<TransactionInput, ValidationError> {
        TransactionInput::from_json(&self.payload)
    }
}

/// Reads newline-delimited JSON transactions from an async stream
pub struct TransactionReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin> TransactionReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Next non-blank line, or `None` at end of input.
    ///
    /// Lines are handed out as bytes; invalid UTF-8 is left for
    /// [`RawTransaction::decode`] to reject.
    pub async fn next_transaction(&mut self) -> Result<Option<RawTransaction>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .await
                .with_context(|| format!("Failed to read input line {}", self.line_no + 1))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let payload = self.buf.trim_ascii();
            if payload.is_empty() {
                continue;
            }
            return Ok(Some(RawTransaction {
                line: self.line_no,
                payload: payload.to_vec(),
            }));
        }
    }

    /// Lines consumed so far, blank ones included
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}
