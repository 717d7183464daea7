//! Translation proxy: keeps the DeepL key off the client and answers with
//! one string per source text for every requested language.

use crate::config::Config;
use crate::gateway::TranslationGateway;
use crate::i18n::{LanguageCode, TranslationMetrics};
use crate::model::{truncate_detail, ContentUnit, Failure, FailureKind, TranslationBatch};
use crate::providers::{default_base_url, DeepLProvider};
use crate::reconcile::reconcile;
use crate::retry::RetryConfig;
use crate::status::TracingStatus;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const INVALID_INPUT: &str = "Missing texts, targetLanguages, or apiKey.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest {
    texts: Vec<String>,
    target_languages: Vec<String>,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
    pub retry: RetryConfig,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self {
            config: Arc::new(config),
            client,
            retry: RetryConfig::provider_call(),
        })
    }

    fn provider(&self, api_key: &str) -> DeepLProvider {
        let base_url = self
            .config
            .deepl_api_url
            .clone()
            .unwrap_or_else(|| default_base_url(api_key).to_string());
        DeepLProvider::new(self.client.clone(), api_key)
            .with_base_url(base_url)
            .with_retry(self.retry.clone())
    }
}

/// `CorsLayer` answers every OPTIONS request itself, so the translate route
/// only needs POST and a 405 fallback.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route(
            "/api/translate",
            post(translate).fallback(method_not_allowed),
        )
        .route("/api/metrics", get(metrics))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Translation proxy listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> impl IntoResponse {
    Json(TranslationMetrics::global().report())
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// The plugin posts JSON without a content type, so the body is parsed by
/// hand rather than through the `Json` extractor.
async fn translate(State(state): State<AppState>, body: Bytes) -> Response {
    let request: TranslateRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected translate request: {}", e);
            return error_response(StatusCode::BAD_REQUEST, INVALID_INPUT);
        }
    };

    let api_key = match request
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.deepl_api_key.clone())
    {
        Some(key) => key,
        None => return error_response(StatusCode::BAD_REQUEST, INVALID_INPUT),
    };

    // Each requested code keeps the spelling the client sent; unusable codes
    // fail on their own instead of sinking the whole request.
    let mut requested: Vec<(String, Option<LanguageCode>)> = Vec::new();
    let mut languages: Vec<LanguageCode> = Vec::new();
    for raw in &request.target_languages {
        match LanguageCode::parse(raw) {
            Ok(code) => {
                if !languages.contains(&code) {
                    languages.push(code.clone());
                }
                requested.push((raw.clone(), Some(code)));
            }
            Err(e) => {
                warn!("Unusable target language {:?}: {}", raw, e);
                requested.push((raw.clone(), None));
            }
        }
    }

    info!(
        "Translating {} texts into {} languages",
        request.texts.len(),
        languages.len()
    );

    // Positions stand in for node ids; the wire format is positional.
    let units = request
        .texts
        .iter()
        .enumerate()
        .map(|(i, text)| ContentUnit::new(i.to_string(), text.clone()))
        .collect();
    let batch = TranslationBatch::new(units, languages);

    let gateway = TranslationGateway::new(state.provider(&api_key))
        .with_detail_limit(state.config.error_detail_limit);
    let raw = gateway
        .translate(&request.texts, batch.target_languages(), &TracingStatus)
        .await;

    let translated: HashMap<LanguageCode, Vec<String>> = reconcile(&batch, &raw)
        .into_iter()
        .map(|result| (result.language.clone(), result.to_wire()))
        .collect();

    let mut body = Map::new();
    for (raw_code, code) in requested {
        let texts = match code.and_then(|code| translated.get(&code).cloned()) {
            Some(texts) => texts,
            None => unsupported_language(&raw_code, request.texts.len(), &state.config),
        };
        body.insert(raw_code, Value::from(texts));
    }

    Json(Value::Object(body)).into_response()
}

/// One provider failure per text for a code that could not be requested.
fn unsupported_language(raw_code: &str, slots: usize, config: &Config) -> Vec<String> {
    let detail = truncate_detail(
        &format!("unsupported language {}", raw_code.trim()),
        config.error_detail_limit,
    );
    let failure = Failure::new(FailureKind::Provider, None, Some(&detail));
    vec![failure.sentinel().to_string(); slots]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use crate::model::TranslatedText;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn state(deepl_url: Option<String>, server_key: Option<&str>) -> AppState {
        let config = Config {
            deepl_api_url: deepl_url,
            deepl_api_key: server_key.map(str::to_string),
            ..Config::default()
        };
        AppState {
            config: Arc::new(config),
            client: reqwest::Client::new(),
            retry: RetryConfig::new(1, Duration::from_millis(10)),
        }
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/translate")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ==================== Method Handling Tests ====================

    #[tokio::test]
    async fn test_options_returns_cors_headers() {
        let app = router(state(None, None));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/translate")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("POST") && methods.contains("OPTIONS"));
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_lowercase();
        assert!(allowed.contains("content-type") && allowed.contains("authorization"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_browser_preflight_is_answered() {
        let app = router(state(None, None));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/translate")
            .header(header::ORIGIN, "https://www.figma.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        for verb in ["GET", "PUT", "DELETE"] {
            let app = router(state(None, None));
            let request = Request::builder()
                .method(verb)
                .uri("/api/translate")
                .body(Body::empty())
                .unwrap();

            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", verb);
            assert_eq!(json_body(response).await["error"], "Method Not Allowed");
        }
    }

    // ==================== Input Validation Tests ====================

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let cases = [
            serde_json::json!({ "targetLanguages": ["ES"], "apiKey": "k" }),
            serde_json::json!({ "texts": "Hello", "targetLanguages": ["ES"], "apiKey": "k" }),
            serde_json::json!({ "texts": ["Hello"], "targetLanguages": "ES", "apiKey": "k" }),
            serde_json::json!({ "texts": ["Hello"], "targetLanguages": ["ES"] }),
        ];

        for case in cases {
            let app = router(state(None, None));
            let response = app.oneshot(post_json(case.clone())).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", case);
            assert_eq!(json_body(response).await["error"], INVALID_INPUT);
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_bad_request() {
        let app = router(state(None, None));
        let request = Request::builder()
            .method("POST")
            .uri("/api/translate")
            .body(Body::from("texts=Hello"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ==================== Translation Tests ====================

    #[tokio::test]
    async fn test_translate_fans_out_and_encodes_failures() {
        let deepl = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(body_partial_json(serde_json::json!({ "target_lang": "ES" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [{ "text": "Hola" }, { "text": "Adiós" }]
            })))
            .expect(1)
            .mount(&deepl)
            .await;

        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(body_partial_json(serde_json::json!({ "target_lang": "FR" })))
            .respond_with(
                ResponseTemplate::new(456)
                    .set_body_json(serde_json::json!({ "message": "Quota exceeded" })),
            )
            .expect(1)
            .mount(&deepl)
            .await;

        let app = router(state(Some(deepl.uri()), None));
        let response = app
            .oneshot(post_json(serde_json::json!({
                "texts": ["Hello", "Bye"],
                "targetLanguages": ["ES", "FR"],
                "apiKey": "client-key"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ES"], serde_json::json!(["Hola", "Adiós"]));
        assert_eq!(
            body["FR"],
            serde_json::json!([
                "[Provider Err FR: Quota exceeded]",
                "[Provider Err FR: Quota exceeded]"
            ])
        );
    }

    #[tokio::test]
    async fn test_short_provider_answer_becomes_format_sentinels() {
        let deepl = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [{ "text": "Hola" }]
            })))
            .mount(&deepl)
            .await;

        let app = router(state(Some(deepl.uri()), Some("server-key")));
        let response = app
            .oneshot(post_json(serde_json::json!({
                "texts": ["Hello", "Bye"],
                "targetLanguages": ["ES"]
            })))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(
            body["ES"],
            serde_json::json!([
                "[Format Err ES: format-mismatch]",
                "[Format Err ES: format-mismatch]"
            ])
        );
    }

    #[tokio::test]
    async fn test_response_is_keyed_by_requested_code() {
        let deepl = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(body_partial_json(serde_json::json!({ "target_lang": "ES" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [{ "text": "Hola" }]
            })))
            .expect(1)
            .mount(&deepl)
            .await;

        let app = router(state(Some(deepl.uri()), None));
        let response = app
            .oneshot(post_json(serde_json::json!({
                "texts": ["Hello"],
                "targetLanguages": ["es", "ES"],
                "apiKey": "k"
            })))
            .await
            .unwrap();

        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "es": ["Hola"], "ES": ["Hola"] })
        );
    }

    #[tokio::test]
    async fn test_unusable_code_fails_alone() {
        let deepl = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [{ "text": "Hola" }]
            })))
            .expect(1)
            .mount(&deepl)
            .await;

        let app = router(state(Some(deepl.uri()), None));
        let response = app
            .oneshot(post_json(serde_json::json!({
                "texts": ["Hello"],
                "targetLanguages": ["ES", "EN US"],
                "apiKey": "k"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ES"], serde_json::json!(["Hola"]));
        let failed = body["EN US"][0].as_str().unwrap();
        assert_eq!(failed, "[Provider Err: unsupported language EN US]");
        assert!(TranslatedText::from_wire(failed).is_upstream_failure());
    }

    #[tokio::test]
    async fn test_empty_texts_need_no_provider() {
        let app = router(state(Some("http://127.0.0.1:1".into()), None));
        let response = app
            .oneshot(post_json(serde_json::json!({
                "texts": [],
                "targetLanguages": ["ES", "FR"],
                "apiKey": "k"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "ES": [], "FR": [] })
        );
    }

    // ==================== Auxiliary Route Tests ====================

    #[tokio::test]
    async fn test_health() {
        let app = router(state(None, None));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_metrics_report() {
        let app = router(state(None, None));
        let request = Request::builder()
            .uri("/api/metrics")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body.get("provider_calls").is_some());
        assert!(body.get("provider_success_rate").is_some());
    }
}
