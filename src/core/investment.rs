//! The investment entity and its thin derived helpers.

use crate::core::error::InvalidInvestmentError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_TARGET_RATE: f64 = 0.03;
pub const DEFAULT_LOSS_RATE: f64 = 0.03;

/// Lifecycle of an investment. Transitions only ever advance:
/// in-progress -> matured -> sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvestmentStatus {
    InProgress,
    Matured,
    Sold,
}

impl InvestmentStatus {
    fn rank(self) -> u8 {
        match self {
            InvestmentStatus::InProgress => 0,
            InvestmentStatus::Matured => 1,
            InvestmentStatus::Sold => 2,
        }
    }
}

impl Display for InvestmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                InvestmentStatus::InProgress => "in-progress",
                InvestmentStatus::Matured => "matured",
                InvestmentStatus::Sold => "sold",
            }
        )
    }
}

/// The profit fraction last reported to the holder. Embedded by value and
/// overwritten whole on every new notification; never a history log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub percent: f64,
}

/// A currency conversion position: `capital` in `base_currency` was converted
/// into `buy_currency` at the bank-executed `buy_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub capital: f64,
    pub base_currency: String,
    pub buy_currency: String,
    /// The bank-executed conversion rate, not the market rate.
    pub buy_price: f64,
    pub buy_date: NaiveDate,
    pub target_rate: f64,
    pub loss_rate: f64,
    pub status: InvestmentStatus,
    /// The originating investment when a matured one is rolled over.
    pub parent_id: Option<Uuid>,
    pub notification: Option<Notification>,
    /// Bumped by the store on every successful write; guards against
    /// lost updates when concurrent analyses notify the same investment.
    #[serde(default)]
    pub version: u64,
}

impl Investment {
    /// Validates invariants and builds a new in-progress investment with the
    /// default target/loss rates. `today` is passed in so callers (and tests)
    /// control the clock.
    pub fn create(
        capital: f64,
        buy_currency: &str,
        buy_price: f64,
        buy_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, InvalidInvestmentError> {
        if !(capital > 0.0) {
            return Err(InvalidInvestmentError::NonPositiveCapital(capital));
        }
        if !(buy_price > 0.0) {
            return Err(InvalidInvestmentError::NonPositiveBuyPrice(buy_price));
        }
        if buy_date > today {
            return Err(InvalidInvestmentError::FutureBuyDate { buy_date, today });
        }

        Ok(Investment {
            id: Uuid::new_v4(),
            capital,
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            buy_currency: buy_currency.to_string(),
            buy_price,
            buy_date,
            target_rate: DEFAULT_TARGET_RATE,
            loss_rate: DEFAULT_LOSS_RATE,
            status: InvestmentStatus::InProgress,
            parent_id: None,
            notification: None,
            version: 0,
        })
    }

    /// Replaces the default target/loss rates, keeping them within `[0, 1)`.
    pub fn with_rates(
        mut self,
        target_rate: f64,
        loss_rate: f64,
    ) -> Result<Self, InvalidInvestmentError> {
        for (name, value) in [("target_rate", target_rate), ("loss_rate", loss_rate)] {
            if !(0.0..1.0).contains(&value) {
                return Err(InvalidInvestmentError::RateOutOfBounds { name, value });
            }
        }
        self.target_rate = target_rate;
        self.loss_rate = loss_rate;
        Ok(self)
    }

    /// Advances the lifecycle status. Moving backwards is rejected.
    pub fn advance_status(
        &mut self,
        to: InvestmentStatus,
    ) -> Result<(), InvalidInvestmentError> {
        if to.rank() < self.status.rank() {
            return Err(InvalidInvestmentError::StatusRegression {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// The capital floor below which a loss alert fires, i.e.
    ///   capital   = $20K
    ///   loss rate = 0.03
    ///   threshold = $19400
    pub fn loss_threshold(&self) -> f64 {
        self.capital * (1.0 - self.loss_rate)
    }

    /// The return at which the position should be sold, i.e.
    ///   capital       = $20K
    ///   target rate   = 0.03
    ///   target return = $20600
    pub fn target_return(&self) -> f64 {
        self.capital * (1.0 + self.target_rate)
    }

    /// Capital restated in the buy currency at the bank-executed price,
    /// before any interest accrual.
    pub fn converted_capital_base(&self) -> f64 {
        self.capital * self.buy_price
    }
}
