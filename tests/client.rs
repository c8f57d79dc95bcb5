//! Integration tests for the request/response surface, driven against a
//! local mock HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockito::Matcher;
use serde_json::json;
use toonapi::{ActiveState, ApiConfig, ChannelState, Error, ProgramState, Status, Toon};

fn test_config(server: &mockito::ServerGuard) -> ApiConfig {
    ApiConfig {
        base_url: server.url(),
        request_retries: 0,
        retry_backoff_ms: 10,
        ..ApiConfig::default()
    }
}

fn agreements_body() -> String {
    json!([
        {
            "agreementId": "1665",
            "agreementIdChecksum": "a4b0",
            "displayCommonName": "eneco-001-000000",
            "street": "Marineweg",
            "houseNumber": "3",
            "postalCode": "2222 AA",
            "city": "Den Haag",
            "heatingType": "GAS",
        },
        {
            "agreementId": "2048",
            "displayCommonName": "eneco-002-000000",
        }
    ])
    .to_string()
}

fn status_body() -> String {
    json!({
        "thermostatInfo": {
            "currentDisplayTemp": 2030,
            "currentSetpoint": 1800,
            "programState": 1,
            "activeState": 1,
            "burnerInfo": "1",
            "errorFound": 255,
            "currentModulationLevel": 45,
            "haveOTBoiler": 0,
        },
        "gasUsage": {
            "value": 0,
            "dayUsage": 1850,
            "avgValue": 212,
            "avgDayValue": 3300,
            "meterReading": 1234567,
            "dayCost": 1.43,
            "isSmart": 1,
        },
        "powerUsage": {
            "value": 462,
            "dayUsage": 4200,
            "dayLowUsage": 3100,
            "avgValue": 426.4,
            "meterReading": 7643733,
            "meterReadingLow": 8458755,
            "dayCost": 2.2,
        },
        "waterUsage": {
            "value": 0,
            "dayUsage": 112,
            "installed": 1,
        },
        "serverTime": 1580830000000_i64,
        "lastUpdateFromDisplay": 1580829000000_i64,
    })
    .to_string()
}

async fn mock_agreements(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/toon/v3/agreements")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agreements_body())
        .create_async()
        .await
}

/// Stamps change on every merge; clear them so payload-identical snapshots
/// compare equal.
fn scrub(mut status: Status) -> Status {
    status.last_updated = None;
    status.thermostat.last_updated = None;
    status.power_usage.last_updated = None;
    status.gas_usage.last_updated = None;
    status.water_usage.last_updated = None;
    status
}

#[tokio::test]
async fn test_agreements_listing() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_agreements(&mut server).await;

    let toon = Toon::with_config("test-token", test_config(&server));
    let agreements = toon.agreements().await.unwrap();

    assert_eq!(agreements.len(), 2);
    assert_eq!(agreements[0].agreement_id, "1665");
    assert_eq!(agreements[0].display_common_name, "eneco-001-000000");
    assert_eq!(agreements[0].city.as_deref(), Some("Den Haag"));
    assert_eq!(agreements[1].agreement_id, "2048");
    assert!(agreements[1].city.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_agreements_sends_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/toon/v3/agreements")
        .match_header("authorization", "Bearer test-token")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agreements_body())
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.agreements().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_activate_unknown_agreement_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_agreements(&mut server).await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.agreements().await.unwrap();

    let result = toon.activate_agreement("9999").await;
    assert!(matches!(result, Err(Error::UnknownAgreement(id)) if id == "9999"));

    // the defensive check never issues a request of its own
    mock.assert_async().await;
}

#[tokio::test]
async fn test_activate_fetches_agreements_when_unlisted() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_agreements(&mut server).await;

    let toon = Toon::with_config("test-token", test_config(&server));
    let agreement = toon.activate_agreement("1665").await.unwrap();

    assert_eq!(agreement.display_common_name, "eneco-001-000000");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_activate_by_display_common_name() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.agreements().await.unwrap();

    let agreement = toon
        .activate_agreement_by_display("eneco-002-000000")
        .await
        .unwrap();
    assert_eq!(agreement.agreement_id, "2048");
}

#[tokio::test]
async fn test_update_without_activation_fails() {
    let server = mockito::Server::new_async().await;
    let toon = Toon::with_config("test-token", test_config(&server));

    assert!(matches!(toon.update().await, Err(Error::NoAgreementActivated)));
}

#[tokio::test]
async fn test_update_parses_status() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;
    let status_mock = server
        .mock("GET", "/toon/v3/1665/status")
        .match_header("x-agreement-id", "1665")
        .match_header("x-common-name", "eneco-001-000000")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(status_body())
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.activate_agreement("1665").await.unwrap();
    let status = toon.update().await.unwrap();

    assert_eq!(status.agreement.agreement_id, "1665");
    assert_eq!(status.thermostat.current_display_temperature, Some(20.3));
    assert_eq!(status.thermostat.current_setpoint, Some(18.0));
    assert_eq!(status.thermostat.active_state, Some(ActiveState::Home));
    assert_eq!(status.thermostat.program_state, Some(ProgramState::On));
    assert_eq!(status.thermostat.heating(), Some(true));
    assert_eq!(status.thermostat.error_found, Some(false));
    assert_eq!(status.thermostat.have_opentherm_boiler, Some(false));
    assert_eq!(status.gas_usage.day_usage, Some(1.85));
    assert_eq!(status.gas_usage.meter, Some(1234.57));
    assert_eq!(status.power_usage.current, Some(462));
    assert_eq!(status.power_usage.day_usage(), Some(7.3));
    assert_eq!(status.water_usage.installed, Some(true));
    assert!(status.server_time.is_some());

    // the accessor returns the same snapshot
    let cached = toon.status().await.unwrap();
    assert_eq!(scrub(cached), scrub(status));

    status_mock.assert_async().await;
}

#[tokio::test]
async fn test_partial_update_retains_other_sections() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;
    let _full_mock = server
        .mock("GET", "/toon/v3/1665/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(status_body())
        .create_async()
        .await;
    let _partial_mock = server
        .mock("GET", "/toon/v3/1665/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"gasUsage": {"value": 300}}).to_string())
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.activate_agreement("1665").await.unwrap();

    let full = toon.update().await.unwrap();
    let partial = toon.update().await.unwrap();

    // untouched sections stay byte-identical, stamps included
    assert_eq!(full.thermostat, partial.thermostat);
    assert_eq!(full.power_usage, partial.power_usage);
    assert_eq!(full.water_usage, partial.water_usage);
    assert_eq!(partial.gas_usage.current, Some(0.3));
    assert_eq!(partial.gas_usage.day_usage, full.gas_usage.day_usage);
}

#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;
    let _status_mock = server
        .mock("GET", "/toon/v3/1665/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(status_body())
        .expect(2)
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.activate_agreement("1665").await.unwrap();

    let first = toon.update().await.unwrap();
    let second = toon.update().await.unwrap();

    assert_eq!(scrub(first), scrub(second));
}

#[tokio::test]
async fn test_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/toon/v3/agreements")
        .with_status(401)
        .create_async()
        .await;

    let toon = Toon::with_config("expired-token", test_config(&server));
    let result = toon.agreements().await;

    assert!(matches!(result, Err(Error::Authentication(_))));
}

#[tokio::test]
async fn test_server_error_retries_then_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/toon/v3/agreements")
        .with_status(502)
        .expect(2)
        .create_async()
        .await;

    let config = ApiConfig {
        request_retries: 1,
        ..test_config(&server)
    };
    let toon = Toon::with_config("test-token", config);
    let result = toon.agreements().await;

    assert!(matches!(result, Err(Error::Api { status: 502, .. })));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_payload_is_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/toon/v3/agreements")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json at all")
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    assert!(matches!(toon.agreements().await, Err(Error::Api { .. })));
}

#[tokio::test]
async fn test_rate_limit_without_retries() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/toon/v3/agreements")
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    let result = toon.agreements().await;

    match result {
        Err(Error::RateLimit { retry_after }) => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected a rate limit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_respects_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let limited = server
        .mock("GET", "/toon/v3/agreements")
        .with_status(429)
        .with_header("retry-after", "1")
        .create_async()
        .await;
    let recovered = server
        .mock("GET", "/toon/v3/agreements")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agreements_body())
        .create_async()
        .await;

    let config = ApiConfig {
        request_retries: 1,
        ..test_config(&server)
    };
    let toon = Toon::with_config("test-token", config);

    let start = std::time::Instant::now();
    let agreements = toon.agreements().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(agreements.len(), 2);
    assert!(
        elapsed >= Duration::from_millis(900),
        "request should have waited for retry-after, but only took {elapsed:?}",
    );

    limited.assert_async().await;
    recovered.assert_async().await;
}

struct RotatingToken(AtomicUsize);

#[async_trait]
impl toonapi::TokenProvider for RotatingToken {
    async fn access_token(&self) -> toonapi::Result<String> {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        Ok(format!("token-{}", n + 1))
    }
}

#[tokio::test]
async fn test_token_provider_consulted_per_request() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/toon/v3/agreements")
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agreements_body())
        .create_async()
        .await;
    let second = server
        .mock("GET", "/toon/v3/agreements")
        .match_header("authorization", "Bearer token-2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agreements_body())
        .create_async()
        .await;

    let toon = Toon::with_token_provider(
        Arc::new(RotatingToken(AtomicUsize::new(0))),
        test_config(&server),
    );
    toon.agreements().await.unwrap();
    toon.agreements().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_set_current_setpoint_puts_and_merges() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;
    let put = server
        .mock("PUT", "/toon/v3/1665/thermostat")
        .match_header("x-agreement-id", "1665")
        .match_body(Matcher::Json(json!({
            "currentSetpoint": 1950,
            "programState": 2,
            "activeState": 5,
        })))
        .with_status(200)
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.activate_agreement("1665").await.unwrap();
    toon.set_current_setpoint(19.5).await.unwrap();

    let status = toon.status().await.unwrap();
    assert_eq!(status.thermostat.current_setpoint, Some(19.5));
    assert_eq!(status.thermostat.program_overridden(), Some(true));
    assert_eq!(status.thermostat.active_state, Some(ActiveState::Off));

    put.assert_async().await;
}

#[tokio::test]
async fn test_set_active_state_puts_and_merges() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;
    let put = server
        .mock("PUT", "/toon/v3/1665/thermostat")
        .match_body(Matcher::Json(json!({
            "programState": 1,
            "activeState": 3,
        })))
        .with_status(200)
        .create_async()
        .await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.activate_agreement("1665").await.unwrap();
    toon.set_active_state(ActiveState::Away, ProgramState::On)
        .await
        .unwrap();

    let status = toon.status().await.unwrap();
    assert_eq!(status.thermostat.active_state, Some(ActiveState::Away));

    put.assert_async().await;
}

#[tokio::test]
async fn test_control_without_activation_fails() {
    let server = mockito::Server::new_async().await;
    let toon = Toon::with_config("test-token", test_config(&server));

    assert!(matches!(
        toon.set_current_setpoint(20.0).await,
        Err(Error::NoAgreementActivated)
    ));
}

#[tokio::test]
async fn test_close_is_idempotent_and_final() {
    let mut server = mockito::Server::new_async().await;
    let _agreements_mock = mock_agreements(&mut server).await;

    let toon = Toon::with_config("test-token", test_config(&server));
    toon.agreements().await.unwrap();

    toon.close().await;
    toon.close().await;

    assert_eq!(toon.channel_state(), ChannelState::Closed);
    assert!(matches!(toon.agreements().await, Err(Error::SessionClosed)));
    assert!(matches!(toon.update().await, Err(Error::NoAgreementActivated)));
}
