use chrono::{Duration, Utc};
use fxvest::core::investment::{Investment, Notification};
use fxvest::core::market::{BankInterest, BankRate, HourlyRate};
use fxvest::store::KeyValueStore;
use std::fs;
use std::path::Path;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_webhook_server(expected_subject: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alerts"))
            .and(body_partial_json(
                serde_json::json!({ "subject": expected_subject }),
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_failing_webhook_server() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn write_config(dir: &Path, data_path: &Path, webhook_url: Option<&str>) -> std::path::PathBuf {
    let notifier = match webhook_url {
        Some(url) => format!("notifier:\n  webhook:\n    url: \"{url}/alerts\"\n"),
        None => String::new(),
    };
    let config_content = format!(
        "base_currency: \"USD\"\n{notifier}data_path: \"{}\"\n",
        data_path.display()
    );
    let config_path = dir.join("config.yaml");
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path
}

/// capital 20000 USD into AUD at 1.25 with a 1.30 quote and 1% fees:
/// current capital = 25000 / 1.313 = 19040.36, under the 19400 loss
/// threshold, profit delta -0.05.
fn seed_loss_scenario(data_path: &Path) -> Investment {
    let store = KeyValueStore::open(data_path).expect("Failed to open store");
    let investments = store.investments().unwrap();
    let market = store.market().unwrap();

    let today = Utc::now().date_naive();
    let investment = Investment::create(
        20000.0,
        "AUD",
        1.25,
        today - Duration::days(90),
        today,
    )
    .unwrap();
    investments.insert(&investment).unwrap();

    market
        .put_bank_rate(&BankRate {
            base_currency: "USD".to_string(),
            to_currency: "AUD".to_string(),
            fee: 0.01,
        })
        .unwrap();
    market
        .put_bank_rate(&BankRate {
            base_currency: "AUD".to_string(),
            to_currency: "USD".to_string(),
            fee: 0.01,
        })
        .unwrap();
    market
        .put_hourly_rate(&HourlyRate {
            currency: "AUD".to_string(),
            datetime: Utc::now() - Duration::hours(1),
            price: 1.30,
        })
        .unwrap();

    investment
}

#[test_log::test(tokio::test)]
async fn test_analyze_dispatches_loss_alert_and_records_it() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data");
    let investment = seed_loss_scenario(&data_path);

    let mock_server = test_utils::create_webhook_server("AUD: -0.05").await;
    let config_path = write_config(dir.path(), &data_path, Some(&mock_server.uri()));

    info!(id = %investment.id, "Running analyze against mock webhook");
    let result = fxvest::run_command(
        fxvest::AppCommand::Analyze { json: true },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Analyze failed with: {:?}", result.err());

    // The dispatched profit figure was persisted with a bumped version.
    let store = KeyValueStore::open(&data_path).unwrap();
    let updated = store
        .investments()
        .unwrap()
        .get(&investment.id)
        .unwrap()
        .unwrap();
    assert_eq!(updated.notification, Some(Notification { percent: -0.05 }));
    assert_eq!(updated.version, 1);
}

#[test_log::test(tokio::test)]
async fn test_failed_dispatch_leaves_state_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data");
    let investment = seed_loss_scenario(&data_path);

    let mock_server = test_utils::create_failing_webhook_server().await;
    let config_path = write_config(dir.path(), &data_path, Some(&mock_server.uri()));

    // The batch must survive a dispatcher outage.
    let result = fxvest::run_command(
        fxvest::AppCommand::Analyze { json: true },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Analyze failed with: {:?}", result.err());

    // No notification state recorded, so the next run retries the alert.
    let store = KeyValueStore::open(&data_path).unwrap();
    let updated = store
        .investments()
        .unwrap()
        .get(&investment.id)
        .unwrap()
        .unwrap();
    assert!(updated.notification.is_none());
    assert_eq!(updated.version, 0);
}

#[test_log::test(tokio::test)]
async fn test_missing_market_data_skips_investment() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data");

    // Investment without any market data behind it.
    let investment = {
        let store = KeyValueStore::open(&data_path).unwrap();
        let today = Utc::now().date_naive();
        let investment = Investment::create(20000.0, "AUD", 1.25, today, today).unwrap();
        store.investments().unwrap().insert(&investment).unwrap();
        investment
    };

    let config_path = write_config(dir.path(), &data_path, None);

    let result = fxvest::run_command(
        fxvest::AppCommand::Analyze { json: false },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Analyze failed with: {:?}", result.err());

    let store = KeyValueStore::open(&data_path).unwrap();
    let unchanged = store
        .investments()
        .unwrap()
        .get(&investment.id)
        .unwrap()
        .unwrap();
    assert!(unchanged.notification.is_none());
}

#[test_log::test(tokio::test)]
async fn test_import_then_query_surface() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data");
    let config_path = write_config(dir.path(), &data_path, None);

    let market_file = dir.path().join("market.yaml");
    fs::write(
        &market_file,
        r#"
bank_rates:
  - base_currency: USD
    to_currency: AUD
    fee: 0.01
bank_interests:
  - currency: AUD
    rate: 0.04
    annual_maturity: 4
    maturity: 3
daily_rates:
  - currency: AUD
    date: 2026-08-28
    price: 1.21
  - currency: AUD
    date: 2026-08-29
    price: 1.22
currencies:
  - symbol: AUD
    name: Australian Dollar
  - symbol: USD
    name: United States Dollar
"#,
    )
    .unwrap();

    let result = fxvest::run_command(
        fxvest::AppCommand::Import {
            file: market_file.to_str().unwrap().to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Import failed with: {:?}", result.err());

    for command in [
        fxvest::AppCommand::Rates {
            symbol: "aud".to_string(),
        },
        fxvest::AppCommand::Currencies,
    ] {
        let result = fxvest::run_command(command, Some(config_path.to_str().unwrap())).await;
        assert!(result.is_ok(), "Query failed with: {:?}", result.err());
    }

    // The imported interest terms round-trip through the store.
    let store = KeyValueStore::open(&data_path).unwrap();
    let interest: BankInterest = store
        .market()
        .unwrap()
        .bank_interest("AUD")
        .unwrap()
        .unwrap();
    assert_eq!(interest.annual_maturity, 4);
    assert_eq!(store.market().unwrap().daily_rates("AUD").unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_add_command_persists_valid_investment() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data");
    let config_path = write_config(dir.path(), &data_path, None);

    let result = fxvest::run_command(
        fxvest::AppCommand::Add {
            capital: 20000.0,
            currency: "aud".to_string(),
            price: 1.25,
            date: None,
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Add failed with: {:?}", result.err());

    let store = KeyValueStore::open(&data_path).unwrap();
    let all = store.investments().unwrap().list().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].buy_currency, "AUD");
    assert_eq!(all[0].base_currency, "USD");

    // An invalid record is reported as skipped, not an error.
    let result = fxvest::run_command(
        fxvest::AppCommand::Add {
            capital: -5.0,
            currency: "AUD".to_string(),
            price: 1.25,
            date: None,
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Add should not fail: {:?}", result.err());

    let store = KeyValueStore::open(&data_path).unwrap();
    assert_eq!(store.investments().unwrap().list().unwrap().len(), 1);
}
