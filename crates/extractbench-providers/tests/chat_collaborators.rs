//! Discovery and extraction against a mocked site and chat endpoint.
//!
//! Uses wiremock for both the seed/item pages and `/v1/chat/completions`.

use std::sync::Arc;
use std::time::Duration;

use extractbench_core::{Document, Extractor, Fetcher, LinkDiscovery, UsageMeter};
use extractbench_providers::{
    ChatClient, ChatExtractor, ChatLinkDiscovery, Endpoint, HttpFetcher, Preprocess, Pricing, Strategy,
    DEFAULT_TIMEOUT,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str, input: u64, output: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": input, "completion_tokens": output, "total_tokens": input + output}
    }))
}

fn client(server: &MockServer) -> Arc<ChatClient> {
    Arc::new(
        ChatClient::new(
            Endpoint::new(format!("{}/v1", server.uri()), None),
            "test-model",
            Pricing::default(),
            Duration::from_secs(5),
        )
        .expect("client"),
    )
}

#[tokio::test]
async fn discovery_returns_picked_links_in_reply_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a href="/about">About</a>
                <a href="/p/1">Widget</a>
                <a href="/p/2">Gadget</a>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("product pages"))
        .respond_with(completion("[3, 2]", 50, 5))
        .mount(&server)
        .await;

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(DEFAULT_TIMEOUT).expect("fetcher"));
    let discovery = ChatLinkDiscovery::new(fetcher, client(&server));

    let links = discovery
        .discover(&format!("{}/shop", server.uri()), "product pages", 10)
        .await
        .expect("discover");
    let urls: Vec<_> = links.iter().map(|l| l.url.clone()).collect();
    assert_eq!(
        urls,
        vec![format!("{}/p/2", server.uri()), format!("{}/p/1", server.uri())]
    );
}

#[tokio::test]
async fn basic_extraction_meters_each_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(r#"{"Name?": "Widget", "Price?": "(not found)"}"#, 120, 30))
        .mount(&server)
        .await;

    let client = client(&server);
    let extractor = ChatExtractor::new(Arc::clone(&client), Strategy::Basic, Preprocess::default());
    let questions = vec!["Name?".to_string(), "Price?".to_string()];
    let doc = Document::new("https://shop/p/1", "<h1>Widget</h1>");

    let before = client.snapshot();
    let answers = extractor.extract(&doc, &questions).await.expect("extract").expect("answers");
    let after = client.snapshot();

    assert_eq!(answers.get("Name?"), Some("Widget"));
    assert!(!answers.contains("Price?"));
    assert_eq!(before.usage.get("total").copied().unwrap_or(0), 0);
    assert_eq!(after.usage["total"], 150);
}

#[tokio::test]
async fn iterative_extraction_asks_once_per_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("Acme", 10, 1))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    let extractor = ChatExtractor::new(Arc::clone(&client), Strategy::IterativePrompt, Preprocess::default());
    let questions = vec!["A?".to_string(), "B?".to_string(), "C?".to_string()];
    let answers = extractor
        .extract(&Document::new("https://x", "page"), &questions)
        .await
        .expect("extract")
        .expect("answers");

    assert_eq!(answers.len(), 3);
    assert_eq!(client.snapshot().usage["input"], 30);
}

#[tokio::test]
async fn server_error_is_an_extraction_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let extractor = ChatExtractor::new(client(&server), Strategy::Basic, Preprocess::default());
    let err = extractor
        .extract(&Document::new("https://x", "page"), &["Q".to_string()])
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("https://x"));
}
