//! Error types the batch processor must branch on.

use crate::core::investment::{Investment, InvestmentStatus};
use chrono::NaiveDate;
use std::fmt::Display;
use thiserror::Error;
use uuid::Uuid;

/// The market data item that could not be resolved for an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingItem {
    BuyRate,
    SellRate,
    HourlyRate,
}

impl Display for MissingItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MissingItem::BuyRate => "buy bank rate",
                MissingItem::SellRate => "sell bank rate",
                MissingItem::HourlyRate => "hourly rate",
            }
        )
    }
}

/// Failure to construct an [`crate::core::AnalysisEngine`] for one investment.
///
/// Fatal for that investment only; batch callers log and skip.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("missing {item} for investment {id} ({base_currency} -> {buy_currency})")]
    MissingData {
        id: Uuid,
        base_currency: String,
        buy_currency: String,
        item: MissingItem,
    },

    /// Snapshot data that would make a divisor zero or negative.
    #[error("degenerate market data for investment {id}: {reason}")]
    DegenerateData { id: Uuid, reason: String },
}

impl AnalysisError {
    pub(crate) fn missing(investment: &Investment, item: MissingItem) -> Self {
        AnalysisError::MissingData {
            id: investment.id,
            base_currency: investment.base_currency.clone(),
            buy_currency: investment.buy_currency.clone(),
            item,
        }
    }

    pub(crate) fn degenerate(investment: &Investment, reason: impl Into<String>) -> Self {
        AnalysisError::DegenerateData {
            id: investment.id,
            reason: reason.into(),
        }
    }
}

/// Invariant violation at investment creation or lifecycle transition.
/// Creation entry points report this as a skipped record, never a crash.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInvestmentError {
    #[error("capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("buy price must be positive, got {0}")]
    NonPositiveBuyPrice(f64),

    #[error("{name} must be within [0, 1), got {value}")]
    RateOutOfBounds { name: &'static str, value: f64 },

    #[error("buy date {buy_date} is after today ({today})")]
    FutureBuyDate { buy_date: NaiveDate, today: NaiveDate },

    #[error("status cannot move back from {from} to {to}")]
    StatusRegression {
        from: InvestmentStatus,
        to: InvestmentStatus,
    },
}
