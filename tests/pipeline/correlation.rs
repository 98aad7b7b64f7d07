use crate::harness::{channel_for, config_for, generate, rewrite_request};
use mailcraft::TransportStrategy;
use mailcraft::transport::protocol::RewritePayload;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{Mock, MockServer, Request as WireRequest, Respond, ResponseTemplate};

/// Echoes the draft back as the body, answering later drafts sooner.
struct EchoInReverse;

impl Respond for EchoInReverse {
    fn respond(&self, request: &WireRequest) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let prompt = body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();
        let draft = prompt.rsplit('\n').next().unwrap_or_default().to_string();
        let delay = match draft.as_str() {
            "first" => 300,
            "second" => 150,
            _ => 0,
        };
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(delay))
            .set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": format!("Subject: Re {draft}\n\nBody: {draft}")}]}}]
            }))
    }
}

async fn mount_echo(server: &MockServer) {
    let mock: Mock = generate().respond_with(EchoInReverse);
    mock.mount(server).await;
}

#[tokio::test]
async fn concurrent_rewrites_never_cross_resolve() {
    let server = MockServer::start().await;
    mount_echo(&server).await;
    let config = config_for(&server);

    for strategy in [TransportStrategy::Port, TransportStrategy::OneShot] {
        let channel = Arc::new(channel_for(&config, strategy));
        let calls: Vec<_> = ["first", "second", "third"]
            .into_iter()
            .map(|draft| {
                let channel = Arc::clone(&channel);
                tokio::spawn(async move { (draft, channel.call(rewrite_request(draft, "formal")).await) })
            })
            .collect();

        for call in calls {
            let (draft, response) = call.await.expect("call task completes");
            assert_eq!(
                response.result_text(),
                Some(format!("Subject: Re {draft}\n\nBody: {draft}").as_str()),
                "{strategy}"
            );
        }
    }
}

#[tokio::test]
async fn service_sees_one_request_per_call() {
    let server = MockServer::start().await;
    mount_echo(&server).await;
    let channel = Arc::new(channel_for(&config_for(&server), TransportStrategy::Port));

    let payload: RewritePayload = serde_json::from_value(serde_json::json!({
        "sourceText": "same",
        "credential": crate::harness::KEY,
    }))
    .expect("payload decodes");
    let calls: Vec<_> = (0..4)
        .map(|_| {
            let channel = Arc::clone(&channel);
            let request = mailcraft::Request::rewrite(&payload).expect("payload encodes");
            tokio::spawn(async move { channel.call(request).await })
        })
        .collect();
    for call in calls {
        assert!(call.await.expect("call task completes").is_success());
    }

    let received = server.received_requests().await.expect("recording is on");
    assert_eq!(received.len(), 4);
}
