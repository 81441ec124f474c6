//! Command implementations and terminal presentation

pub mod analyze;
pub mod import;
pub mod invest;
pub mod rates;
pub mod setup;
pub mod ui;
