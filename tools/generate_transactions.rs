//! Test Transaction Generator
//!
//! Writes random transactions as NDJSON to stdout, ready to pipe into
//! `fraud-scorer`.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use fraud_risk_scorer::TransactionInput;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufWriter, Write};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "generate-transactions")]
struct Args {
    /// Number of transactions to generate
    #[arg(long, default_value_t = 100)]
    count: u64,

    /// Share of suspicious transactions (0.0 - 1.0)
    #[arg(long, default_value_t = 0.1)]
    fraud_ratio: f64,

    /// Seed for reproducible output; dates are then anchored to a fixed day
    #[arg(long)]
    seed: Option<u64>,

    /// Derive hour and weekday from the timestamp instead of sending them
    #[arg(long)]
    timestamps_only: bool,
}

/// Latest date of seeded runs
const SEEDED_ANCHOR: (i32, u32, u32) = (2025, 1, 6);

/// Transaction generator for testing
struct TransactionGenerator {
    rng: StdRng,
    transaction_counter: u64,
    timestamps_only: bool,
    /// Timestamps fall within the week ending on this date
    anchor: NaiveDate,
}

impl TransactionGenerator {
    fn new(seed: Option<u64>, timestamps_only: bool) -> Self {
        let today = Utc::now().date_naive();
        let (rng, anchor) = match seed {
            Some(seed) => {
                let (y, m, d) = SEEDED_ANCHOR;
                let anchor = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(today);
                (StdRng::seed_from_u64(seed), anchor)
            }
            None => (StdRng::from_entropy(), today),
        };
        Self {
            rng,
            transaction_counter: 0,
            timestamps_only,
            anchor,
        }
    }

    /// Generate a random legitimate transaction
    fn generate_legitimate(&mut self) -> TransactionInput {
        let amount = self.rng.gen_range(50.0..15_000.0);
        let hour = self.rng.gen_range(8..21);
        let tx_count = self.rng.gen_range(0..8);
        let new_payee = self.rng.gen_bool(0.1);
        self.build(amount, hour, tx_count, new_payee, false)
    }

    /// Generate a suspicious/fraudulent transaction
    fn generate_suspicious(&mut self) -> TransactionInput {
        let amount = self.rng.gen_range(30_000.0..90_000.0); // High amount
        let hour = if self.rng.gen_bool(0.5) {
            self.rng.gen_range(0..6) // Night time
        } else {
            23
        };
        let tx_count = self.rng.gen_range(12..40); // Many recent transactions
        let new_payee = self.rng.gen_bool(0.8);
        let device_changed = self.rng.gen_bool(0.7);
        self.build(amount, hour, tx_count, new_payee, device_changed)
    }

    fn build(
        &mut self,
        amount: f64,
        hour: i64,
        tx_count: i64,
        new_payee: bool,
        device_changed: bool,
    ) -> TransactionInput {
        self.transaction_counter += 1;

        let days_back = self.rng.gen_range(0..7);
        let day = self.anchor - Duration::days(days_back);
        let minute = self.rng.gen_range(0..60);
        let timestamp = day
            .and_hms_opt(hour as u32, minute, 0)
            .unwrap_or_else(|| day.and_time(NaiveTime::MIN))
            .and_utc();
        let weekday = i64::from(timestamp.weekday().num_days_from_monday());

        let (hour, weekday) = if self.timestamps_only {
            (None, None)
        } else {
            (Some(hour), Some(weekday))
        };

        TransactionInput {
            transaction_id: Some(format!("tx_{:012}", self.transaction_counter)),
            amount: Some((amount * 100.0).round() / 100.0),
            user_id: Some(format!("user_{}", self.rng.gen_range(1..500))),
            merchant_id: Some(format!("merchant_{}", self.rng.gen_range(1..1000))),
            device_id: Some(format!("dev_{:08x}", self.rng.gen::<u32>())),
            hour,
            weekday,
            is_new_payee: Some(i64::from(new_payee)),
            device_changed: Some(i64::from(device_changed)),
            tx_count_24h: Some(tx_count),
            timestamp: Some(timestamp.to_rfc3339()),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_transactions=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.fraud_ratio),
        "--fraud-ratio must be between 0 and 1"
    );

    info!(
        count = args.count,
        fraud_ratio = args.fraud_ratio,
        seed = ?args.seed,
        "Generating transactions"
    );

    let mut generator = TransactionGenerator::new(args.seed, args.timestamps_only);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut legitimate_count = 0u64;
    let mut suspicious_count = 0u64;

    for _ in 0..args.count {
        let transaction = if generator.rng.gen_bool(args.fraud_ratio) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        serde_json::to_writer(&mut out, &transaction)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(
        "Completed! Generated {} transactions ({} legitimate, {} suspicious)",
        args.count, legitimate_count, suspicious_count
    );

    Ok(())
}
