use crate::harness::{
    KEY, candidate, channel_for, config_for, generate, received_prompts, rewrite_request,
};
use mailcraft::TransportStrategy;
use mailcraft::prompt::{Draft, Tone};
use mailcraft::Request;
use serde_json::Value;
use wiremock::{MockServer, ResponseTemplate};

#[tokio::test]
async fn formal_rewrite_round_trips_exactly() {
    let server = MockServer::start().await;
    generate()
        .respond_with(candidate(
            "Subject: File Request\n\nBody: Could you please send me the file?",
        ))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server);
    for strategy in [TransportStrategy::Port, TransportStrategy::OneShot] {
        let channel = channel_for(&config, strategy);
        let response = channel
            .send(rewrite_request("hey can u send me the file", "formal"))
            .await
            .expect("call should resolve");

        assert!(response.is_success(), "{strategy}: {response:?}");
        assert_eq!(
            response.result_text(),
            Some("Subject: File Request\n\nBody: Could you please send me the file?")
        );
    }
}

#[tokio::test]
async fn request_body_carries_prompt_and_generation_settings() {
    let server = MockServer::start().await;
    generate()
        .respond_with(candidate("Subject: Hi\n\nBody: Hello."))
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(rewrite_request("yo", "concise")).await;
    assert!(response.is_success());

    let requests = server.received_requests().await.expect("recording is on");
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert_eq!(body["generationConfig"]["temperature"], 0.2);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 700);

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().expect("prompt");
    assert!(prompt.starts_with("You are an expert email writing assistant."));
    assert!(prompt.contains("more concise and to the point"));
    assert!(prompt.ends_with("Email to rewrite:\nyo"));
}

#[tokio::test]
async fn chatty_model_output_is_normalized() {
    let server = MockServer::start().await;
    generate()
        .respond_with(candidate(
            "## Rewritten email\nSubject:   Project   update\nBody: Hi team,\n\n- shipped v2\n- fixed login   \n\nThanks,\nAna\n\n**Changes made:**\n- friendlier tone",
        ))
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::OneShot);
    let response = channel.call(rewrite_request("update", "friendly")).await;
    assert_eq!(
        response.result_text(),
        Some("Subject: Project update\n\nBody: Hi team,\n\n- shipped v2\n- fixed login\n\nThanks,\nAna")
    );
}

#[tokio::test]
async fn draft_with_inline_instruction_sends_custom_prompt() {
    let server = MockServer::start().await;
    generate()
        .respond_with(candidate("Subject: Deadline\n\nBody: Please reply by Friday."))
        .mount(&server)
        .await;

    let payload = Draft::new("Deadline", "reply soon pls !@# mention Friday")
        .into_payload(Some(Tone::Friendly), None, Some(KEY.to_string()))
        .expect("draft is complete");
    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel
        .call(Request::rewrite(&payload).expect("payload encodes"))
        .await;
    assert!(response.is_success());

    let prompts = received_prompts(&server).await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("according to these instructions: \"mention Friday\""));
    assert!(prompts[0].ends_with("Subject: Deadline\n\nBody: reply soon pls"));
    assert!(!prompts[0].contains("!@#"));
}

#[tokio::test]
async fn empty_envelope_is_reported_as_empty_result() {
    let server = MockServer::start().await;
    generate()
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"candidates":[]}"#))
        .mount(&server)
        .await;

    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(rewrite_request("hello", "formal")).await;
    assert!(!response.is_success());
    assert_eq!(
        response.error_description.as_deref(),
        Some("Empty response from the AI service.")
    );
}

#[tokio::test]
async fn malformed_credential_is_rejected_before_any_http_call() {
    let server = MockServer::start().await;
    generate().respond_with(candidate("unused")).expect(0).mount(&server).await;

    let request = Request::new(
        mailcraft::transport::Action::Rewrite,
        serde_json::json!({"sourceText": "hello", "credential": "not-a-key"}),
    );
    let channel = channel_for(&config_for(&server), TransportStrategy::Port);
    let response = channel.call(request).await;
    assert_eq!(
        response.error_description.as_deref(),
        Some("Invalid API key format")
    );
}
