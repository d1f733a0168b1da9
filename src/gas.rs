//! Refund-aware gas estimation for Safe transactions.
//!
//! The Safe refunds part of the gas cost to whoever executes the transaction.
//! To keep the executor funded after the refund is deducted, the requested
//! `safeTxGas` is inflated by `f / (1 - f)` where `f` is the refund fraction.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use futures::future::join_all;
use serde::Serialize;

use crate::environment::ExecutionEnvironment;
use crate::error::{ConfigError, Result, SafeError};
use crate::types::TransactionIntent;

const BPS_DENOMINATOR: u64 = 10_000;

/// More decimal places than this would overflow a `u64` denominator.
const MAX_DECIMAL_PLACES: usize = 18;

/// Refund fraction applied to every intent of a batch.
///
/// Lower than the usual per-chain value so that bundling many calls does not
/// push the aggregate over the transaction gas limit.
pub const BATCH_REFUND_FRACTION: RefundFraction = RefundFraction { numer: 1, denom: 10 };

/// Refund fraction used for single transactions on chains without a profile.
pub const FALLBACK_REFUND_FRACTION: RefundFraction = RefundFraction { numer: 1, denom: 10 };

/// A refund fraction in `[0, 1)`, kept as a reduced ratio so that
/// overestimation is exact for any rational value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefundFraction {
    pub(crate) numer: u64,
    pub(crate) denom: u64,
}

impl RefundFraction {
    /// Zero refund: estimates are used unchanged.
    pub const ZERO: Self = Self { numer: 0, denom: 1 };

    /// `numer / denom`, reduced to lowest terms.
    pub fn new(numer: u64, denom: u64) -> Result<Self, ConfigError> {
        if denom == 0 || numer >= denom {
            return Err(ConfigError::InvalidRefundFraction(format!("{numer}/{denom}")));
        }
        let divisor = gcd(numer, denom);
        Ok(Self {
            numer: numer / divisor,
            denom: denom / divisor,
        })
    }

    /// Build from basis points (`3_000` is `0.3`).
    pub fn from_bps(bps: u32) -> Result<Self, ConfigError> {
        Self::new(u64::from(bps), BPS_DENOMINATOR)
    }

    /// Build from the shortest decimal that round-trips to `fraction`, so
    /// `0.3` is exactly `3/10`.
    pub fn from_f64(fraction: f64) -> Result<Self, ConfigError> {
        if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::InvalidRefundFraction(fraction.to_string()));
        }
        if fraction == 0.0 {
            return Ok(Self::ZERO);
        }
        fraction.to_string().parse()
    }

    pub fn numer(self) -> u64 {
        self.numer
    }

    pub fn denom(self) -> u64 {
        self.denom
    }

    pub fn as_f64(self) -> f64 {
        self.numer as f64 / self.denom as f64
    }

    /// `floor(raw + raw * f / (1 - f))`, computed exactly.
    pub fn overestimate(self, raw: u64) -> u64 {
        let scaled = u128::from(raw) * u128::from(self.denom);
        let inflated = scaled / u128::from(self.denom - self.numer);
        u64::try_from(inflated).unwrap_or(u64::MAX)
    }
}

/// Accepts a decimal (`"0.25"`) or a ratio (`"1/3"`).
impl FromStr for RefundFraction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidRefundFraction(s.to_string());

        if let Some((numer, denom)) = s.split_once('/') {
            let numer = numer.trim().parse().map_err(|_| invalid())?;
            let denom = denom.trim().parse().map_err(|_| invalid())?;
            return Self::new(numer, denom).map_err(|_| invalid());
        }

        let (whole, decimals) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && decimals.is_empty())
            || !all_digits(whole)
            || !all_digits(decimals)
            || decimals.len() > MAX_DECIMAL_PLACES
        {
            return Err(invalid());
        }

        let parse_part = |part: &str| match part {
            "" => Ok(0u64),
            digits => digits.parse::<u64>().map_err(|_| invalid()),
        };
        let denom = 10u64.pow(decimals.len() as u32);
        let (whole, decimals) = (parse_part(whole)?, parse_part(decimals)?);
        let numer = whole
            .checked_mul(denom)
            .and_then(|n| n.checked_add(decimals))
            .ok_or_else(invalid)?;

        Self::new(numer, denom).map_err(|_| invalid())
    }
}

impl fmt::Display for RefundFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Gas figures for one transaction (or the total of a batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub raw: u64,
    pub overestimated: u64,
}

impl GasEstimate {
    pub fn new(raw: u64, refund_fraction: RefundFraction) -> Self {
        Self {
            raw,
            overestimated: refund_fraction.overestimate(raw),
        }
    }
}

/// Per-intent estimates in input order together with their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateGasEstimate {
    pub per_intent: Vec<GasEstimate>,
    pub total: GasEstimate,
}

impl AggregateGasEstimate {
    pub fn from_parts(per_intent: Vec<GasEstimate>) -> Self {
        let total = per_intent.iter().fold(
            GasEstimate { raw: 0, overestimated: 0 },
            |acc, e| GasEstimate {
                raw: acc.raw.saturating_add(e.raw),
                overestimated: acc.overestimated.saturating_add(e.overestimated),
            },
        );
        Self { per_intent, total }
    }

    pub fn single(estimate: GasEstimate) -> Self {
        Self {
            per_intent: vec![estimate],
            total: estimate,
        }
    }
}

fn check_ceiling(raw: u64, max_gas_per_tx: Option<u64>, index: Option<usize>) -> Result<()> {
    match max_gas_per_tx {
        Some(limit) if raw > limit => Err(SafeError::GasLimitExceeded {
            index,
            estimate: raw,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Estimate one intent sent from `wallet`.
///
/// `max_gas_per_tx` of `None` disables the ceiling (chains without a profile).
pub async fn estimate<E: ExecutionEnvironment>(
    env: &E,
    wallet: Address,
    intent: &TransactionIntent,
    refund_fraction: RefundFraction,
    max_gas_per_tx: Option<u64>,
) -> Result<GasEstimate> {
    let raw = env.simulate_call(wallet, intent).await?;
    tracing::debug!(to = %intent.to, raw, "gas estimate");
    check_ceiling(raw, max_gas_per_tx, None)?;

    let estimate = GasEstimate::new(raw, refund_fraction);
    tracing::debug!(overestimated = estimate.overestimated, %refund_fraction, "overestimated gas");
    Ok(estimate)
}

/// Estimate every intent of a batch with [`BATCH_REFUND_FRACTION`].
///
/// Simulations run concurrently; results and errors are reported in input
/// order, so the first offending intent is the one named in the error.
pub async fn estimate_batch<E: ExecutionEnvironment>(
    env: &E,
    wallet: Address,
    intents: &[TransactionIntent],
    max_gas_per_tx: Option<u64>,
) -> Result<AggregateGasEstimate> {
    if intents.is_empty() {
        return Err(SafeError::EmptyTransaction);
    }

    let raws = join_all(intents.iter().map(|intent| env.simulate_call(wallet, intent))).await;

    let mut per_intent = Vec::with_capacity(intents.len());
    for (index, raw) in raws.into_iter().enumerate() {
        let raw = raw?;
        check_ceiling(raw, max_gas_per_tx, Some(index))?;
        let estimate = GasEstimate::new(raw, BATCH_REFUND_FRACTION);
        tracing::debug!(index, raw, overestimated = estimate.overestimated, "batch gas estimate");
        per_intent.push(estimate);
    }

    let aggregate = AggregateGasEstimate::from_parts(per_intent);
    tracing::debug!(total = aggregate.total.overestimated, "batch gas total");
    Ok(aggregate)
}
