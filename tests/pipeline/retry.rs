use crate::harness::{
    KEY, candidate, channel_for, config_for, generate, rewrite_request, unreachable_config,
};
use mailcraft::TransportStrategy;
use wiremock::{MockServer, ResponseTemplate};

async fn mount_status_once(server: &MockServer, status: u16) {
    generate()
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn overload_then_rate_limit_then_success() {
    let server = MockServer::start().await;
    mount_status_once(&server, 503).await;
    mount_status_once(&server, 429).await;
    generate()
        .respond_with(candidate("Subject: Ok\n\nBody: Third time lucky."))
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(rewrite_request("hello", "formal")).await;
    assert!(response.is_success(), "{response:?}");
    assert_eq!(
        response.result_text(),
        Some("Subject: Ok\n\nBody: Third time lucky.")
    );
}

#[tokio::test]
async fn persistent_overload_stops_after_max_attempts() {
    let server = MockServer::start().await;
    generate()
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::OneShot);
    let response = channel.call(rewrite_request("hello", "formal")).await;
    assert!(!response.is_success());
    assert_eq!(
        response.error_description.as_deref(),
        Some("AI service is temporarily overloaded. Please try again in a few seconds.")
    );
}

#[tokio::test]
async fn rate_limit_exhaustion_has_its_own_message() {
    let server = MockServer::start().await;
    generate()
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(rewrite_request("hello", "formal")).await;
    assert_eq!(
        response.error_description.as_deref(),
        Some("Rate limit reached. Please wait a moment and try again.")
    );
}

#[tokio::test]
async fn terminal_status_is_not_retried_and_scrubs_the_key() {
    let server = MockServer::start().await;
    generate()
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": format!("API key not valid: key={KEY}")}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(rewrite_request("hello", "formal")).await;
    let description = response.error_description.expect("failure carries a description");
    assert!(description.starts_with("API Error (400): API key not valid"), "{description}");
    assert!(!description.contains(KEY), "{description}");
    assert!(description.contains("[REDACTED]"), "{description}");
}

#[tokio::test]
async fn unreachable_service_is_a_network_failure() {
    let config = unreachable_config();
    for strategy in [TransportStrategy::Port, TransportStrategy::OneShot] {
        let channel = channel_for(&config, strategy);
        let response = channel.call(rewrite_request("hello", "formal")).await;
        assert!(!response.is_success(), "{strategy}");
        assert_eq!(
            response.error_description.as_deref(),
            Some("Failed to reach AI service."),
            "{strategy}"
        );
    }
}
