//! The analysis engine: derived financial metrics and the notify decision
//! for a single investment against point-in-time market snapshots.

use crate::core::error::{AnalysisError, MissingItem};
use crate::core::investment::{Investment, Notification};
use crate::core::market::{BankInterest, BankRate, HourlyRate, MarketSnapshot};
use crate::core::notify::NotificationDispatcher;
use anyhow::Result;
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

/// All derived metrics for one analysis, in their dependency order.
/// Field order is the published key order of the report; serde keeps it
/// for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub original_capital: f64,
    pub interest_mature: bool,
    pub base_converted_capital: f64,
    pub converted_interest: f64,
    pub current_converted_interest: f64,
    pub converted_capital: f64,
    pub market_buy_price: f64,
    pub actual_buy_price: f64,
    pub actual_sell_price: f64,
    pub current_sell_price: f64,
    pub current_capital: f64,
    pub target_return: f64,
    pub target_sell_price: f64,
    pub target_inverted_sell_price: f64,
    pub make_even_sell_price: f64,
    pub make_even_inverted_sell_price: f64,
    pub matured_interest: f64,
    pub current_interest: f64,
    pub loss_threshold: f64,
    pub profit_delta: f64,
}

impl AnalysisReport {
    /// The report as ordered `key = value` pairs for display and for the
    /// notification body.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("original_capital", self.original_capital.to_string()),
            ("interest_mature", self.interest_mature.to_string()),
            (
                "base_converted_capital",
                self.base_converted_capital.to_string(),
            ),
            ("converted_interest", self.converted_interest.to_string()),
            (
                "current_converted_interest",
                self.current_converted_interest.to_string(),
            ),
            ("converted_capital", self.converted_capital.to_string()),
            ("market_buy_price", self.market_buy_price.to_string()),
            ("actual_buy_price", self.actual_buy_price.to_string()),
            ("actual_sell_price", self.actual_sell_price.to_string()),
            ("current_sell_price", self.current_sell_price.to_string()),
            ("current_capital", self.current_capital.to_string()),
            ("target_return", self.target_return.to_string()),
            ("target_sell_price", self.target_sell_price.to_string()),
            (
                "target_inverted_sell_price",
                self.target_inverted_sell_price.to_string(),
            ),
            ("make_even_sell_price", self.make_even_sell_price.to_string()),
            (
                "make_even_inverted_sell_price",
                self.make_even_inverted_sell_price.to_string(),
            ),
            ("matured_interest", self.matured_interest.to_string()),
            ("current_interest", self.current_interest.to_string()),
            ("loss_threshold", self.loss_threshold.to_string()),
            ("profit_delta", self.profit_delta.to_string()),
        ]
    }
}

/// Owns one investment plus its resolved market snapshot and the evaluation
/// time. All metrics are pure functions of that state.
#[derive(Debug)]
pub struct AnalysisEngine {
    investment: Investment,
    buy_rate: BankRate,
    sell_rate: BankRate,
    bank_interest: Option<BankInterest>,
    hourly_rate: HourlyRate,
    today: NaiveDate,
}

impl AnalysisEngine {
    /// Builds an engine from an investment and its snapshot as of `now`.
    ///
    /// A missing buy rate, sell rate or hourly quote fails with
    /// [`AnalysisError::MissingData`]; a missing bank interest record means
    /// zero accrual. Fees outside `[0, 1)` or a non-positive quote are
    /// rejected as [`AnalysisError::DegenerateData`] so every divisor used
    /// by the metrics below is provably positive.
    pub fn new(
        investment: Investment,
        snapshot: MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Self, AnalysisError> {
        let buy_rate = snapshot
            .buy_rate
            .ok_or_else(|| AnalysisError::missing(&investment, MissingItem::BuyRate))?;
        let sell_rate = snapshot
            .sell_rate
            .ok_or_else(|| AnalysisError::missing(&investment, MissingItem::SellRate))?;
        let hourly_rate = snapshot
            .latest_quote
            .ok_or_else(|| AnalysisError::missing(&investment, MissingItem::HourlyRate))?;

        for rate in [&buy_rate, &sell_rate] {
            if !(0.0..1.0).contains(&rate.fee) {
                return Err(AnalysisError::degenerate(
                    &investment,
                    format!(
                        "bank fee {} -> {} out of [0, 1): {}",
                        rate.base_currency, rate.to_currency, rate.fee
                    ),
                ));
            }
        }
        if !(hourly_rate.price > 0.0) {
            return Err(AnalysisError::degenerate(
                &investment,
                format!("non-positive hourly rate: {}", hourly_rate.price),
            ));
        }

        Ok(AnalysisEngine {
            investment,
            buy_rate,
            sell_rate,
            bank_interest: snapshot.bank_interest,
            hourly_rate,
            today: now.date_naive(),
        })
    }

    pub fn investment(&self) -> &Investment {
        &self.investment
    }

    pub fn into_investment(self) -> Investment {
        self.investment
    }

    pub fn hourly_rate(&self) -> &HourlyRate {
        &self.hourly_rate
    }

    //
    // Interest related methods
    //

    /// Whether the accrued interest has reached its eligibility date. The
    /// boundary at the exact month count is inclusive.
    pub fn interest_mature(&self) -> bool {
        match &self.bank_interest {
            Some(interest) => self
                .today
                .checked_sub_months(Months::new(interest.maturity))
                .is_some_and(|cutoff| cutoff >= self.investment.buy_date),
            None => false,
        }
    }

    pub fn converted_interest(&self) -> f64 {
        match &self.bank_interest {
            Some(interest) => {
                self.base_converted_capital() * (interest.rate / f64::from(interest.annual_maturity))
            }
            None => 0.0,
        }
    }

    /// Zero until the interest has matured.
    pub fn current_converted_interest(&self) -> f64 {
        if self.interest_mature() {
            self.converted_interest()
        } else {
            0.0
        }
    }

    pub fn matured_interest(&self) -> f64 {
        self.converted_interest() / self.actual_sell_price()
    }

    pub fn current_interest(&self) -> f64 {
        if self.interest_mature() {
            self.matured_interest()
        } else {
            0.0
        }
    }

    //
    // Capital in the purchased currency
    //

    pub fn base_converted_capital(&self) -> f64 {
        self.investment.converted_capital_base()
    }

    /// Principal plus accrued interest once matured.
    pub fn converted_capital(&self) -> f64 {
        self.base_converted_capital() + self.current_converted_interest()
    }

    //
    // Buy/sell price methods
    //

    /// The implied pre-fee market rate at purchase.
    pub fn market_buy_price(&self) -> f64 {
        self.investment.buy_price / (1.0 - self.buy_rate.fee)
    }

    pub fn actual_buy_price(&self) -> f64 {
        self.investment.buy_price
    }

    /// Fee-inflated current exit price.
    pub fn actual_sell_price(&self) -> f64 {
        self.hourly_rate.price * (1.0 + self.sell_rate.fee)
    }

    pub fn current_sell_price(&self) -> f64 {
        self.hourly_rate.price
    }

    // The target sell price is more beneficial when the interest is matured
    pub fn target_sell_price(&self) -> f64 {
        self.target_return() / (self.converted_capital() * (1.0 - self.sell_rate.fee))
    }

    pub fn target_inverted_sell_price(&self) -> f64 {
        1.0 / self.target_sell_price()
    }

    // The make-even price is more beneficial when the interest is matured
    pub fn make_even_sell_price(&self) -> f64 {
        self.investment.capital / (self.converted_capital() * (1.0 - self.sell_rate.fee))
    }

    pub fn make_even_inverted_sell_price(&self) -> f64 {
        1.0 / self.make_even_sell_price()
    }

    //
    // Investment level metrics
    //

    pub fn original_capital(&self) -> f64 {
        self.investment.capital
    }

    /// Present value restated in base currency units.
    pub fn current_capital(&self) -> f64 {
        self.converted_capital() / self.actual_sell_price()
    }

    pub fn target_return(&self) -> f64 {
        self.investment.target_return()
    }

    pub fn loss_threshold(&self) -> f64 {
        self.investment.loss_threshold()
    }

    /// Fractional gain or loss versus original capital, rounded to exactly
    /// two decimal places. The rounding is a published contract, not
    /// cosmetic.
    pub fn profit_delta(&self) -> f64 {
        let delta = (self.current_capital() - self.original_capital()) / self.original_capital();
        (delta * 100.0).round() / 100.0
    }

    //
    // Decisions
    //

    pub fn should_sell(&self) -> bool {
        self.hourly_rate.price <= self.target_inverted_sell_price()
    }

    pub fn loss_beyond_threshold(&self) -> bool {
        self.current_capital() < self.loss_threshold()
    }

    /// Whether the holder should be alerted, in priority order: a recovered
    /// loss is always reported once; a sell or loss signal is reported on
    /// first occurrence and on any change of the profit figure; repeats of
    /// the same figure are suppressed.
    pub fn should_notify(&self) -> bool {
        let notification = self.investment.notification;

        if let Some(notification) = notification {
            if notification.percent < 0.0 && self.profit_delta() >= 0.0 {
                return true;
            }
        }

        if self.should_sell() || self.loss_beyond_threshold() {
            return match notification {
                None => true,
                Some(notification) => notification.percent != self.profit_delta(),
            };
        }

        false
    }

    /// Every metric as an ordered report. Pure; calling it twice with the
    /// same engine yields the same output.
    pub fn snapshot(&self) -> AnalysisReport {
        AnalysisReport {
            original_capital: self.original_capital(),
            interest_mature: self.interest_mature(),
            base_converted_capital: self.base_converted_capital(),
            converted_interest: self.converted_interest(),
            current_converted_interest: self.current_converted_interest(),
            converted_capital: self.converted_capital(),
            market_buy_price: self.market_buy_price(),
            actual_buy_price: self.actual_buy_price(),
            actual_sell_price: self.actual_sell_price(),
            current_sell_price: self.current_sell_price(),
            current_capital: self.current_capital(),
            target_return: self.target_return(),
            target_sell_price: self.target_sell_price(),
            target_inverted_sell_price: self.target_inverted_sell_price(),
            make_even_sell_price: self.make_even_sell_price(),
            make_even_inverted_sell_price: self.make_even_inverted_sell_price(),
            matured_interest: self.matured_interest(),
            current_interest: self.current_interest(),
            loss_threshold: self.loss_threshold(),
            profit_delta: self.profit_delta(),
        }
    }

    /// Dispatches an alert and records the reported profit fraction on the
    /// investment. The notification field is replaced whole, never appended
    /// to; no other field is touched. A dispatch failure leaves it unchanged
    /// so the next evaluation cycle retries the same alert.
    pub async fn notify_buyer(
        &mut self,
        dispatcher: &dyn NotificationDispatcher,
    ) -> Result<()> {
        let profit_delta = self.profit_delta();
        let subject = format!("{}: {}", self.investment.buy_currency, profit_delta);

        dispatcher.send(&subject, &self.body()).await?;
        debug!(investment = %self.investment.id, %subject, "Alert dispatched");

        self.investment.notification = Some(Notification {
            percent: profit_delta,
        });
        Ok(())
    }

    fn body(&self) -> String {
        let mut lines: Vec<String> = self
            .snapshot()
            .entries()
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect();
        lines.push(format!(
            "Current rate (as of {}) = {}",
            self.hourly_rate.datetime, self.hourly_rate.price
        ));
        lines.join("\n")
    }
}
