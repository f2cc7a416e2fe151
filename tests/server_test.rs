//! End-to-end: server against mocked Bing, OpenAI and page hosts, read back
//! through the streaming client.

use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use websearch::client::{ResultView, SearchClient};
use websearch::config::Config;
use websearch::protocol::{Decoded, StreamEvent};
use websearch::server::{build_pipeline, create_router, ApiState};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(upstream: &MockServer) -> Config {
    let mut config = Config::default();
    config.search.endpoint = format!("{}/bing/v7.0/custom/search", upstream.uri());
    config.search.api_key = Some("bing-test-key".into());
    config.search.custom_config_id = Some("cfg-123".into());
    config.openai.base_url = format!("{}/v1", upstream.uri());
    config.openai.api_key = Some("sk-test".into());
    config.deep_search.quantity = 2;
    config
}

/// Serve the router on an ephemeral port and return its `/websearch` URL
async fn start_server(config: &Config) -> String {
    let pipeline = build_pipeline(config).expect("pipeline");
    let state = Arc::new(ApiState {
        pipeline: Arc::new(pipeline),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    format!("http://{}/websearch", addr)
}

async fn collect_events(endpoint: &str, query: &str) -> Vec<Decoded> {
    let client = SearchClient::new(endpoint.to_string(), reqwest::Client::new());
    let stream = client.search(query).await.expect("request");
    stream.map(|item| item.expect("decoded event")).collect().await
}

fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::from("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for delta in deltas {
        let frame = json!({"choices": [{"delta": {"content": delta}}]});
        body.push_str(&format!("data: {}\n\n", frame));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn mount_bing(upstream: &MockServer) {
    let page = |p: &str| format!("{}{}", upstream.uri(), p);
    Mock::given(method("GET"))
        .and(path("/bing/v7.0/custom/search"))
        .and(query_param("q", "rust ownership"))
        .and(query_param("customconfig", "cfg-123"))
        .and(header("Ocp-Apim-Subscription-Key", "bing-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_type": "SearchResponse",
            "webPages": {"value": [
                {"name": "Ownership Guide", "url": page("/guide"), "snippet": "All about ownership"},
                {"name": "Broken Page", "url": page("/broken"), "snippet": "Gone"},
                {"name": "Unpicked", "url": page("/other"), "snippet": "Not chosen"}
            ]}
        })))
        .expect(1)
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn streams_full_deep_search() {
    let upstream = MockServer::start().await;
    mount_bing(&upstream).await;

    let selection = json!({"selected_urls": [
        {"url": format!("{}/guide", upstream.uri()), "reason": "best"},
        {"url": format!("{}/broken", upstream.uri()), "reason": "maybe"}
    ]});
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": selection.to_string()}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><nav>menu</nav><p>Each value has an owner.</p></body></html>",
            "text/html",
        ))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .and(body_string_contains("Each value has an owner."))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["# Ownership\n\n", "Values have ", "one owner."])),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let endpoint = start_server(&test_config(&upstream)).await;
    let events = collect_events(&endpoint, "rust ownership").await;

    let names: Vec<&str> = events
        .iter()
        .map(|d| match d {
            Decoded::Event(e) => e.name(),
            Decoded::Unknown(_) => "unknown",
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "initial_response",
            "processing_status",
            "processing_status",
            "url_processed",
            "processing_status",
            "ai_response",
            "ai_response",
            "ai_response",
        ]
    );

    assert!(events.contains(&Decoded::Event(StreamEvent::UrlProcessed {
        url: "Ownership Guide".into()
    })));

    let mut view = ResultView::new("rust ownership");
    for event in &events {
        view.apply(event);
    }
    assert_eq!(view.results.len(), 3);
    assert_eq!(view.results[0].title, "Ownership Guide");
    assert_eq!(view.answer, "# Ownership\n\nValues have one owner.");
    assert!(view.errors.is_empty());
    assert!(view.status.is_none());
}

#[tokio::test]
async fn search_failure_becomes_error_event() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bing/v7.0/custom/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&upstream)
        .await;

    let endpoint = start_server(&test_config(&upstream)).await;
    let events = collect_events(&endpoint, "anything").await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        Decoded::Event(StreamEvent::Error { message }) => {
            assert!(message.starts_with("An error occurred: "));
            assert!(message.contains("500"));
        }
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn deep_search_disabled_answers_from_snippets() {
    let upstream = MockServer::start().await;
    mount_bing(&upstream).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .and(body_string_contains("All about ownership"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["From snippets."])),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let mut config = test_config(&upstream);
    config.deep_search.enabled = false;
    let endpoint = start_server(&config).await;
    let events = collect_events(&endpoint, "rust ownership").await;

    assert!(!events
        .iter()
        .any(|e| matches!(e, Decoded::Event(StreamEvent::UrlProcessed { .. }))));
    assert_eq!(
        events.last(),
        Some(&Decoded::Event(StreamEvent::AiResponse {
            content: "From snippets.".into()
        }))
    );
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let upstream = MockServer::start().await;
    let endpoint = start_server(&test_config(&upstream)).await;

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let client = SearchClient::new(endpoint, reqwest::Client::new());
    let err = client.search("").await.err().expect("non-2xx is an error");
    assert!(err.to_string().contains("HTTP error! status: 400"));
}

#[tokio::test]
async fn health_and_headers() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bing/v7.0/custom/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;
    let endpoint = start_server(&test_config(&upstream)).await;
    let base = endpoint.trim_end_matches("/websearch");

    let health: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "headers"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let upstream = MockServer::start().await;
    let endpoint = start_server(&test_config(&upstream)).await;
    let http = reqwest::Client::new();

    let requests = vec![
        http.post(&endpoint).header("content-type", "application/json").body(""),
        http.post(&endpoint).body(r#"{"query":"rust"}"#),
        http.post(&endpoint).json(&json!({"query": 5})),
        http.post(&endpoint).header("content-type", "application/json").body("{not json"),
    ];

    for request in requests {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 400);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let upstream = MockServer::start().await;
    let endpoint = start_server(&test_config(&upstream)).await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, &endpoint)
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["access-control-allow-origin"].to_str().unwrap(),
        "*"
    );
    assert!(response.headers().contains_key("access-control-allow-methods"));
}

/// Slow page first in the selection, fast page second
async fn mount_slow_and_fast(upstream: &MockServer) {
    let page = |p: &str| format!("{}{}", upstream.uri(), p);
    Mock::given(method("GET"))
        .and(path("/bing/v7.0/custom/search"))
        .and(query_param("q", "page order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "webPages": {"value": [
                {"name": "Slow Page", "url": page("/slow"), "snippet": "slow"},
                {"name": "Fast Page", "url": page("/fast"), "snippet": "fast"}
            ]}
        })))
        .mount(upstream)
        .await;

    let selection = json!({"selected_urls": [
        {"url": page("/slow"), "reason": "first"},
        {"url": page("/fast"), "reason": "second"}
    ]});
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": selection.to_string()}}]
        })))
        .mount(upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><p>slow body</p></body></html>", "text/html")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><p>fast body</p></body></html>", "text/html"),
        )
        .mount(upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["done"])),
        )
        .mount(upstream)
        .await;
}

fn processed_titles(events: &[Decoded]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Decoded::Event(StreamEvent::UrlProcessed { url }) => Some(url.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn pages_are_reported_in_completion_order() {
    let upstream = MockServer::start().await;
    mount_slow_and_fast(&upstream).await;

    let endpoint = start_server(&test_config(&upstream)).await;
    let events = collect_events(&endpoint, "page order").await;

    assert_eq!(processed_titles(&events), vec!["Fast Page", "Slow Page"]);
}

#[tokio::test]
async fn single_fetch_slot_keeps_selection_order() {
    let upstream = MockServer::start().await;
    mount_slow_and_fast(&upstream).await;

    let mut config = test_config(&upstream);
    config.fetch.concurrency = 1;
    let endpoint = start_server(&config).await;
    let events = collect_events(&endpoint, "page order").await;

    assert_eq!(processed_titles(&events), vec!["Slow Page", "Fast Page"]);
}
