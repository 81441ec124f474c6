//! Core business logic abstractions

pub mod analysis;
pub mod config;
pub mod error;
pub mod investment;
pub mod log;
pub mod market;
pub mod notify;

// Re-export main types for cleaner imports
pub use analysis::{AnalysisEngine, AnalysisReport};
pub use error::{AnalysisError, InvalidInvestmentError};
pub use investment::{Investment, InvestmentStatus, Notification};
pub use market::{BankInterest, BankRate, HourlyRate, MarketDataProvider, MarketSnapshot};
pub use notify::NotificationDispatcher;
