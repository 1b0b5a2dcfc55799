use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

use crate::errors::CliError;
use crate::parse::response::{error_detail, parse_archive, parse_generated, parse_illustration};
use crate::poem::{ArchivedPoem, GenerateRequest, GeneratedPoem, IllustrationStatus, PoemMode};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    debug: bool,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub request_id: Option<String>,
    pub elapsed_ms: u128,
    pub json: Value,
}

impl ApiClient {
    pub fn new(base_url: String, timeout_ms: u64, debug: bool) -> Result<Self, CliError> {
        let timeout = Duration::from_millis(timeout_ms.max(1));
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            debug,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json(
        &self,
        path: &str,
        query: Option<&[(String, String)]>,
    ) -> Result<ApiResponse, CliError> {
        self.request_json(Method::GET, path, query, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, CliError> {
        self.request_json(Method::POST, path, None, Some(body)).await
    }

    /// Sends one request. There is no retry: a failure is reported as is.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, CliError> {
        let url = join_url(&self.base_url, path);
        let started = Instant::now();
        let mut request = self.client.request(method.clone(), url.clone());

        if let Some(query_items) = query {
            request = request.query(query_items);
        }

        if let Some(payload) = body {
            request = request.json(payload);
        }

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(%method, %url, error = %err, "request failed");
                let message = if err.is_timeout() {
                    "Request timed out.".to_string()
                } else {
                    format!("Network request failed: {err}")
                };
                return Err(CliError::Network(message));
            }
        };

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let text = resp.text().await?;
        let elapsed_ms = started.elapsed().as_millis();
        tracing::debug!(
            %method,
            %url,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "api request"
        );

        if !status.is_success() {
            let payload = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({}));
            return Err(self.http_error(status, request_id, &payload, &text));
        }

        let parsed = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str::<Value>(&text).map_err(|e| {
                CliError::Parse(format!("Invalid JSON in response from {path}: {e}"))
            })?
        };

        Ok(ApiResponse {
            request_id,
            elapsed_ms,
            json: parsed,
        })
    }

    fn http_error(
        &self,
        status: StatusCode,
        request_id: Option<String>,
        payload: &Value,
        raw: &str,
    ) -> CliError {
        let mut details = format!("HTTP error! status: {}", status.as_u16());
        if let Some(detail) = error_detail(payload) {
            details.push_str(&format!(" ({detail})"));
        }
        if let Some(id) = request_id {
            details.push_str(&format!(" (request_id: {id})"));
        }
        if self.debug {
            details.push_str(&format!(" body={raw}"));
        }

        match status.as_u16() {
            500..=599 => CliError::Server(details),
            _ => CliError::Http(details),
        }
    }
}

// Poem service endpoints.
impl ApiClient {
    /// Ask the service for a new poem. Whitespace-only prompts never reach the network.
    pub async fn generate_poem(
        &self,
        prompt: &str,
        mode: PoemMode,
    ) -> Result<GeneratedPoem, CliError> {
        let request = GenerateRequest::new(prompt, mode);
        if request.prompt.is_empty() {
            return Err(CliError::Usage("Prompt is empty.".to_string()));
        }
        let body = serde_json::to_value(&request)?;
        let res = self.post_json("/generate", &body).await?;
        parse_generated(&res.json)
    }

    pub async fn list_poems(&self) -> Result<Vec<ArchivedPoem>, CliError> {
        let res = self.get_json("/poems", None).await?;
        parse_archive(&res.json)
    }

    pub async fn illustration_status(
        &self,
        poem_id: &str,
    ) -> Result<IllustrationStatus, CliError> {
        let query = [("poem_id".to_string(), poem_id.to_string())];
        let res = self.get_json("/illustration", Some(&query)).await?;
        parse_illustration(&res.json)
    }

    pub async fn health(&self) -> Result<ApiResponse, CliError> {
        self.get_json("/health", None).await
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use super::*;
    use crate::poem::IllustrationState;

    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: String) -> ApiClient {
        ApiClient::new(base, 5_000, true).unwrap()
    }

    async fn record_generate(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().unwrap().push(body);
        Json(json!({
            "title": "Happiness is warm Zapper",
            "body": "I'd like to invent a pocket-sized Zapper",
            "signature": "(J.D. Evans, a pseudonym)",
            "similar_poems": [],
            "poem_id": "p-1"
        }))
    }

    #[tokio::test]
    async fn generate_posts_trimmed_prompt_once() {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route("/generate", post(record_generate))
            .with_state(seen.clone());
        let api = client(serve(router).await);

        let poem = api
            .generate_poem("  a zapper  ", PoemMode::Eighties)
            .await
            .unwrap();

        assert_eq!(poem.poem_id.as_deref(), Some("p-1"));
        let bodies = seen.lock().unwrap().clone();
        assert_eq!(bodies, vec![json!({ "prompt": "a zapper", "mode": "1980s" })]);
    }

    #[tokio::test]
    async fn blank_prompt_issues_no_request() {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route("/generate", post(record_generate))
            .with_state(seen.clone());
        let api = client(serve(router).await);

        let err = api.generate_poem(" \n\t ", PoemMode::Classic).await.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_ok_status_is_a_generic_http_error() {
        let router = Router::new().route(
            "/generate",
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "model offline" })),
                )
            }),
        );
        let api = client(serve(router).await);

        let err = api.generate_poem("rain", PoemMode::Classic).await.unwrap_err();
        assert!(matches!(err, CliError::Server(_)));
        let message = err.to_string();
        assert!(message.starts_with("HTTP error! status: 500"), "{message}");
        assert!(message.contains("model offline"));

        let router = Router::new().route("/poems", get(|| async { AxumStatus::NOT_FOUND }));
        let api = client(serve(router).await);
        let err = api.list_poems().await.unwrap_err();
        assert!(matches!(err, CliError::Http(_)));
    }

    #[tokio::test]
    async fn http_error_text_has_no_cli_hint() {
        let router = Router::new().route(
            "/generate",
            post(|| async { (AxumStatus::BAD_GATEWAY, Json(json!({ "detail": "busy" }))) }),
        );
        let api = ApiClient::new(serve(router).await, 5_000, false).unwrap();

        let err = api.generate_poem("rain", PoemMode::Classic).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502 (busy)");
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let router = Router::new().route("/poems", get(|| async { "<html>oops</html>" }));
        let api = client(serve(router).await);

        let err = api.list_poems().await.unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
    }

    #[tokio::test]
    async fn archive_accepts_wrapped_payload() {
        let router = Router::new().route(
            "/poems",
            get(|| async {
                Json(json!({ "poems": [
                    { "id": 1, "title": "One", "content": "a", "signature": "s" },
                    { "id": "two", "title": "Two", "content": "b", "signature": null }
                ]}))
            }),
        );
        let api = client(serve(router).await);

        let poems = api.list_poems().await.unwrap();
        let ids: Vec<&str> = poems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "two"]);
    }

    #[tokio::test]
    async fn illustration_status_sends_poem_id_query() {
        let router = Router::new().route(
            "/illustration",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let id = params.get("poem_id").cloned().unwrap_or_default();
                Json(json!({
                    "status": "ready",
                    "illustration_url": format!("https://img.example/{id}.png")
                }))
            }),
        );
        let api = client(serve(router).await);

        let status = api.illustration_status("p 9").await.unwrap();
        assert_eq!(status.status, IllustrationState::Ready);
        assert_eq!(
            status.illustration_url.as_deref(),
            Some("https://img.example/p 9.png")
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(format!("http://{addr}"));
        let err = api.health().await.unwrap_err();
        assert!(matches!(err, CliError::Network(_)));
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(join_url("http://h/", "/generate"), "http://h/generate");
        assert_eq!(join_url("http://h", "poems"), "http://h/poems");
        assert_eq!(join_url("http://h", "https://other/x"), "https://other/x");
    }
}
