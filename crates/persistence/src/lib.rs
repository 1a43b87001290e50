#![deny(warnings)]

//! Persistence and reporting collaborators.
//!
//! Saves are JSON wrapped in a small envelope carrying a format version and
//! a SHA-256 hash of the campaign configuration, so a save can only be
//! restored against the setup that produced it. Digests of arbitrary
//! serializable values (bincode bytes hashed with SHA-256) back the
//! bit-identical replay checks.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sim_core::{ActionKind, TurnRecord, Vocabulary};
use std::fs;
use std::path::Path;
use tracing::info;

/// Version written into every save envelope.
pub const FORMAT_VERSION: u32 = 1;

/// Envelope around a saved payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveFile<T> {
    pub format_version: u32,
    /// Hex SHA-256 of the configuration the payload was produced with.
    pub config_hash: String,
    pub payload: T,
}

impl<T> SaveFile<T> {
    pub fn new(config_hash: String, payload: T) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            config_hash,
            payload,
        }
    }

    /// Refuse payloads produced under a different configuration.
    pub fn verify_config(&self, expected_hash: &str) -> Result<()> {
        if self.config_hash != expected_hash {
            bail!(
                "save was produced with config {} but {} was supplied",
                self.config_hash,
                expected_hash
            );
        }
        Ok(())
    }
}

/// Hex SHA-256 over the bincode encoding of `value`.
pub fn digest<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = bincode::serialize(value).context("encoding value for digest")?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash identifying a campaign configuration.
pub fn config_hash<T: Serialize>(config: &T) -> Result<String> {
    digest(config).context("hashing campaign config")
}

/// Write `payload` as pretty JSON inside a versioned envelope.
pub fn save_json<T: Serialize>(path: &Path, config_hash: &str, payload: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let envelope = SaveFile::new(config_hash.to_string(), payload);
    let text = serde_json::to_string_pretty(&envelope).context("serializing save")?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "campaign saved");
    Ok(())
}

/// Read a save written by [`save_json`]. Unknown format versions are refused.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<SaveFile<T>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let envelope: SaveFile<T> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    if envelope.format_version != FORMAT_VERSION {
        bail!(
            "unsupported save format {} (expected {})",
            envelope.format_version,
            FORMAT_VERSION
        );
    }
    info!(path = %path.display(), "campaign loaded");
    Ok(envelope)
}

/// Money as integer cents, rounded half away from zero.
pub fn decimal_to_cents_i64(d: Decimal) -> Option<i64> {
    (d * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// One spreadsheet-style line per resolved quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub turn: u32,
    pub date: NaiveDate,
    pub quarter: String,
    pub economy: String,
    pub market: String,
    pub user_share: f64,
    pub competitor_share: f64,
    pub user_cash_cents: i64,
    pub competitor_cash_cents: i64,
    pub user_action: ActionKind,
    pub competitor_action: ActionKind,
    pub personality: String,
    pub phase: String,
    pub events: Vec<String>,
}

/// Flatten records into report rows, in turn order.
pub fn report_rows(records: &[TurnRecord], vocabulary: Vocabulary) -> Result<Vec<ReportRow>> {
    records
        .iter()
        .map(|r| {
            let cents = |d: Decimal| {
                decimal_to_cents_i64(d)
                    .with_context(|| format!("cash {d} out of range at turn {}", r.turn))
            };
            Ok(ReportRow {
                turn: r.turn,
                date: r.date,
                quarter: format!("{:?}", r.environment.quarter()),
                economy: format!("{:?}", r.environment.economy),
                market: format!("{:?}", r.environment.market_type),
                user_share: r.user.market_share,
                competitor_share: r.competitor.market_share,
                user_cash_cents: cents(r.user.cash)?,
                competitor_cash_cents: cents(r.competitor.cash)?,
                user_action: r.user_action.kind,
                competitor_action: r.competitor_action.kind,
                personality: r.ai.personality.label(vocabulary).to_string(),
                phase: format!("{:?}", r.ai.phase),
                events: r.events.iter().map(|e| e.message.clone()).collect(),
            })
        })
        .collect()
}

/// Write report rows as a pretty JSON array.
pub fn export_report_json(path: &Path, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let text = serde_json::to_string_pretty(rows).context("serializing report")?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "report exported");
    Ok(())
}
