use crate::harness::{KEY, channel_for, config_for, models, unreachable_config};
use mailcraft::{Request, TransportStrategy};
use serde_json::json;
use wiremock::matchers::query_param;
use wiremock::{MockServer, ResponseTemplate};

#[tokio::test]
async fn probe_success_means_valid() {
    let server = MockServer::start().await;
    models()
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::OneShot);
    let response = channel
        .call(Request::validate_credential(KEY).expect("payload encodes"))
        .await;
    assert!(response.is_success());
    assert_eq!(response.result, Some(json!({"valid": true})));
}

#[tokio::test]
async fn rejected_probe_means_invalid_not_error() {
    let server = MockServer::start().await;
    models()
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel
        .call(Request::validate_credential(KEY).expect("payload encodes"))
        .await;
    assert!(response.is_success());
    assert_eq!(response.result, Some(json!({"valid": false})));
}

#[tokio::test]
async fn unreachable_service_means_invalid() {
    let channel = channel_for(&unreachable_config(), TransportStrategy::Port);
    let response = channel
        .call(Request::validate_credential(KEY).expect("payload encodes"))
        .await;
    assert!(response.is_success());
    assert_eq!(response.result, Some(json!({"valid": false})));
}

#[tokio::test]
async fn badly_shaped_key_skips_the_probe() {
    let server = MockServer::start().await;
    models()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel
        .call(Request::validate_credential("short key").expect("payload encodes"))
        .await;
    assert_eq!(response.result, Some(json!({"valid": false})));
}

#[tokio::test]
async fn ping_reports_host_time() {
    let server = MockServer::start().await;
    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(Request::ping()).await;
    assert!(response.is_success());
    let ts = response.result.expect("result")["ts"].as_i64().expect("ts");
    assert!(ts > 1_600_000_000_000);
}
