//! The batch evaluation: analyze every in-progress investment, alert where
//! the engine says so, and render the results.

use super::ui;
use crate::core::config::AppConfig;
use crate::core::notify::{LogDispatcher, NotificationDispatcher};
use crate::core::{AnalysisEngine, AnalysisReport, Investment, MarketDataProvider};
use crate::notify::WebhookDispatcher;
use crate::store::KeyValueStore;
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct AnalysisRow {
    id: Uuid,
    buy_currency: String,
    capital: f64,
    #[serde(flatten)]
    report: Option<AnalysisReport>,
    should_sell: bool,
    loss_beyond_threshold: bool,
    notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AnalysisRow {
    fn skipped(investment: &Investment, error: String) -> Self {
        AnalysisRow {
            id: investment.id,
            buy_currency: investment.buy_currency.clone(),
            capital: investment.capital,
            report: None,
            should_sell: false,
            loss_beyond_threshold: false,
            notified: false,
            error: Some(error),
        }
    }
}

pub async fn run(config: &AppConfig, store: &KeyValueStore, json: bool) -> Result<()> {
    info!("Analyzing investments...");

    let investments = store.investments()?;
    let market = store.market()?;

    let active = investments.in_progress()?;
    if active.is_empty() {
        println!("No in-progress investments to analyze.");
        return Ok(());
    }

    let dispatcher: Box<dyn NotificationDispatcher> = match &config.notifier.webhook {
        Some(webhook) => Box::new(WebhookDispatcher::new(&webhook.url, webhook.timeout_secs)?),
        None => Box::new(LogDispatcher),
    };

    // One evaluation timestamp for the whole run keeps results replayable.
    let now = Utc::now();

    // Snapshot resolution overlaps across investments; decisions and store
    // writes happen sequentially below.
    let pb = ui::new_progress_bar(active.len() as u64);
    let market_ref = &market;
    let pb_ref = &pb;
    let futures = active.into_iter().map(|investment| async move {
        let snapshot = market_ref
            .snapshot(&investment.base_currency, &investment.buy_currency, now)
            .await;
        pb_ref.inc(1);
        (investment, snapshot)
    });
    let resolved = join_all(futures).await;
    pb.finish_and_clear();

    let mut rows = Vec::new();
    for (investment, snapshot) in resolved {
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(id = %investment.id, error = %e, "Snapshot resolution failed, skipping");
                rows.push(AnalysisRow::skipped(&investment, e.to_string()));
                continue;
            }
        };

        let mut engine = match AnalysisEngine::new(investment.clone(), snapshot, now) {
            Ok(engine) => engine,
            Err(e) => {
                // Fatal for this investment only; the batch moves on.
                warn!(id = %investment.id, error = %e, "Skipping investment");
                rows.push(AnalysisRow::skipped(&investment, e.to_string()));
                continue;
            }
        };

        let mut notified = false;
        if engine.should_notify() {
            match engine.notify_buyer(dispatcher.as_ref()).await {
                Ok(()) => match investments.update(engine.investment()) {
                    Ok(_) => notified = true,
                    Err(e) => {
                        // A concurrent run already recorded its own alert.
                        warn!(id = %engine.investment().id, error = %e,
                            "Could not record notification state");
                    }
                },
                Err(e) => {
                    // Notification state stays untouched so the next run
                    // retries the same alert.
                    warn!(id = %engine.investment().id, error = %e,
                        "Alert dispatch failed, will retry on the next run");
                }
            }
        } else {
            debug!(id = %engine.investment().id, "No alert needed");
        }

        rows.push(AnalysisRow {
            id: engine.investment().id,
            buy_currency: engine.investment().buy_currency.clone(),
            capital: engine.original_capital(),
            should_sell: engine.should_sell(),
            loss_beyond_threshold: engine.loss_beyond_threshold(),
            notified,
            error: None,
            report: Some(engine.snapshot()),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        display_rows(&rows);
    }
    Ok(())
}

fn display_rows(rows: &[AnalysisRow]) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Investment"),
        ui::header_cell("Capital"),
        ui::header_cell("Current"),
        ui::header_cell("Profit"),
        ui::header_cell("Sell"),
        ui::header_cell("Loss"),
        ui::header_cell("Alerted"),
    ]);

    for row in rows {
        let short_id = row.id.to_string();
        let name = format!("{} ({})", row.buy_currency, &short_id[..8]);
        match &row.report {
            Some(report) => {
                table.add_row(vec![
                    Cell::new(name),
                    ui::value_cell(format!("{:.2}", row.capital)),
                    ui::value_cell(format!("{:.2}", report.current_capital)),
                    ui::change_cell(report.profit_delta),
                    Cell::new(if row.should_sell { "yes" } else { "-" }),
                    Cell::new(if row.loss_beyond_threshold { "yes" } else { "-" }),
                    Cell::new(if row.notified { "yes" } else { "-" }),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(name),
                    ui::value_cell(format!("{:.2}", row.capital)),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                ]);
            }
        }
    }

    println!(
        "{}\n\n{table}",
        ui::style_text("Investment analysis", ui::StyleType::Title)
    );

    for row in rows {
        if let Some(error) = &row.error {
            println!(
                "{}",
                ui::style_text(
                    &format!("skipped {} ({}): {error}", row.buy_currency, row.id),
                    ui::StyleType::Error
                )
            );
        }
    }
}
