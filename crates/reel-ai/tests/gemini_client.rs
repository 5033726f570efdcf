//! Gemini client against a mock server.

use std::time::Duration;

use reel_ai::{generate_copy, CaptionGenerator, GeminiClient, GeminiConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIMARY: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
const FALLBACK: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    }))
}

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..GeminiConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_generates_overlay_and_caption() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("Gen-Z"))
        .respond_with(reply("  POV: the bluff actually worked \n"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains("Instagram caption"))
        .respond_with(reply("Hook line\n#bluffinbob #fyp"))
        .expect(1)
        .mount(&server)
        .await;

    let copy = client(&server)
        .generate("test-key", "poker night", None)
        .await
        .unwrap();

    assert_eq!(copy.overlay_text, "POV: the bluff actually worked");
    assert_eq!(copy.caption, "Hook line\n#bluffinbob #fyp");
}

#[tokio::test]
async fn test_manual_text_skips_overlay_generation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Gen-Z"))
        .respond_with(reply("should not be used"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Instagram caption"))
        .respond_with(reply("Caption"))
        .expect(1)
        .mount(&server)
        .await;

    let copy = client(&server)
        .generate("k", "desc", Some("  My own text "))
        .await
        .unwrap();

    assert_eq!(copy.overlay_text, "My own text");
    assert_eq!(copy.caption, "Caption");
}

#[tokio::test]
async fn test_blank_manual_text_is_generated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Gen-Z"))
        .respond_with(reply("Generated"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Instagram caption"))
        .respond_with(reply("Caption"))
        .mount(&server)
        .await;

    let copy = client(&server).generate("k", "desc", Some("   ")).await.unwrap();
    assert_eq!(copy.overlay_text, "Generated");
}

#[tokio::test]
async fn test_falls_back_to_second_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FALLBACK))
        .respond_with(reply("From fallback"))
        .mount(&server)
        .await;

    let text = client(&server).complete("k", "prompt").await.unwrap();
    assert_eq!(text, "From fallback");
}

#[tokio::test]
async fn test_custom_brand_hashtag_reaches_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("#mybrand"))
        .respond_with(reply("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(GeminiConfig {
        base_url: server.uri(),
        brand_hashtag: "#mybrand".to_string(),
        ..GeminiConfig::default()
    })
    .unwrap();

    let copy = client.generate("k", "desc", Some("manual")).await.unwrap();
    assert_eq!(copy.caption, "ok");
}

#[tokio::test]
async fn test_all_models_failing_yields_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let copy = generate_copy(&client(&server), "k", "desc", None).await;

    assert!(copy.is_error());
    assert!(copy.overlay_text.starts_with("AI Error:"));
    assert!(copy.overlay_text.contains("500"));
}

#[tokio::test]
async fn test_empty_candidates_yield_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let copy = generate_copy(&client(&server), "k", "desc", Some("manual")).await;
    assert!(copy.is_error());
}
