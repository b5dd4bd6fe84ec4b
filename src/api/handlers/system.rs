//! Operational route group
//!
//! Mounted as `/system` by the server binary: a liveness check plus echo
//! endpoints that exercise query parsing and request bodies end to end.

use crate::api::{
    endpoint::{Endpoint, QueryParams, Status},
    exampler::{Example, example_of},
    route::{HandlerGroup, Route},
};
use axum::{
    body::to_bytes,
    extract::Request,
    http::{Method, StatusCode},
};
use http_body_util::LengthLimitError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Largest accepted `POST /system/echo` body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;
/// Largest accepted `repeat` query parameter.
pub const MAX_REPEAT: u32 = 100;

/// Liveness and echo endpoints.
#[derive(Debug, Clone)]
pub struct SystemGroup {
    started: Instant,
}

impl Default for SystemGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemGroup {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl HandlerGroup for SystemGroup {
    fn name(&self) -> &str {
        "system"
    }

    fn routes(&self) -> Vec<Route> {
        let started = self.started;
        vec![
            Route::new(
                "Health",
                Method::GET,
                "/health",
                Endpoint::new(move |_, _| {
                    Status::ok(
                        StatusCode::OK,
                        Health {
                            status: "ok".to_string(),
                            version: env!("CARGO_PKG_VERSION").to_string(),
                            uptime_seconds: started.elapsed().as_secs(),
                        },
                    )
                }),
            )
            .with_description("Liveness check. Reports the server version and seconds since start.")
            .with_returns(example_of::<Health>()),
            Route::new("Echo", Method::GET, "/echo", Endpoint::new(echo))
                .with_description(
                    "Repeats `message` `repeat` times. `repeat` defaults to 1 and may not exceed 100.",
                )
                .with_params(example_of::<EchoQuery>())
                .with_returns(example_of::<Echo>()),
            Route::new("EchoBody", Method::POST, "/echo", Endpoint::from_async(echo_body))
                .with_description("Returns the JSON request body unchanged. Bodies over 64 KiB are rejected.")
                .with_accepts(example_of::<EchoPayload>())
                .with_returns(example_of::<EchoPayload>()),
        ]
    }
}

// ============= Payloads =============

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

impl Example for Health {
    fn example() -> Self {
        Health {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoQuery {
    pub message: String,
    pub repeat: u32,
}

impl Example for EchoQuery {
    fn example() -> Self {
        EchoQuery {
            message: "hello".to_string(),
            repeat: 2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub messages: Vec<String>,
}

impl Example for Echo {
    fn example() -> Self {
        Echo {
            messages: vec!["hello".to_string(), "hello".to_string()],
        }
    }
}

/// Illustrative body; any JSON document is echoed.
#[derive(Debug, Serialize, Deserialize)]
pub struct EchoPayload {
    pub message: String,
    pub tags: Vec<String>,
}

impl Example for EchoPayload {
    fn example() -> Self {
        EchoPayload {
            message: "hello".to_string(),
            tags: vec!["demo".to_string()],
        }
    }
}

// ============= Endpoints =============

fn echo(_req: &Request, query: &QueryParams) -> Status {
    let Some(message) = query.get("message") else {
        return Status::err(
            StatusCode::BAD_REQUEST,
            "missing required query parameter 'message'",
        );
    };

    let repeat = match query.get("repeat") {
        None => 1,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if (1..=MAX_REPEAT).contains(&n) => n,
            _ => {
                return Status::err(
                    StatusCode::BAD_REQUEST,
                    format!("'repeat' must be an integer between 1 and {MAX_REPEAT}"),
                );
            }
        },
    };

    Status::ok(
        StatusCode::OK,
        Echo {
            messages: vec![message.to_string(); repeat as usize],
        },
    )
}

async fn echo_body(req: Request, _query: QueryParams) -> Status {
    let bytes = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) if exceeds_limit(&e) => {
            return Status::err(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body exceeds {MAX_BODY_BYTES} bytes"),
            );
        }
        Err(e) => {
            return Status::err(
                StatusCode::BAD_REQUEST,
                format!("request body could not be read: {e}"),
            );
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(body) => Status::ok(StatusCode::OK, body),
        Err(e) => Status::err(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")),
    }
}

/// True when `to_bytes` stopped at the length limit rather than on a
/// transport error.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::Handlers;
    use axum_test::TestServer;
    use serde_json::json;

    fn server() -> TestServer {
        let router = Handlers::new()
            .add(SystemGroup::new())
            .router()
            .expect("system group assembles");
        TestServer::new(router).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let response = server().get("/system/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["result"]["status"], "ok");
        assert_eq!(body["result"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_echo_repeats_message() {
        let response = server()
            .get("/system/echo")
            .add_query_param("message", "hi")
            .add_query_param("repeat", "3")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": {"messages": ["hi", "hi", "hi"]}}));
    }

    #[tokio::test]
    async fn test_echo_requires_message() {
        let response = server().get("/system/echo").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "missing required query parameter 'message'"}));
    }

    #[tokio::test]
    async fn test_echo_rejects_out_of_range_repeat() {
        let response = server()
            .get("/system/echo")
            .add_query_param("message", "hi")
            .add_query_param("repeat", "1000")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_echo_body_round_trips_json() {
        let body = json!({"message": "hello", "tags": ["x"]});
        let response = server().post("/system/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": body}));
    }

    #[tokio::test]
    async fn test_echo_body_rejects_malformed_json() {
        let response = server().post("/system/echo").text("{not json").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().starts_with("invalid JSON body"));
    }

    #[tokio::test]
    async fn test_echo_body_rejects_oversized_body() {
        let response = server()
            .post("/system/echo")
            .text("x".repeat(MAX_BODY_BYTES + 1))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert_eq!(
            body["error"],
            format!("request body exceeds {MAX_BODY_BYTES} bytes")
        );
    }

    #[tokio::test]
    async fn test_echo_body_broken_stream_is_bad_request() {
        let stream = futures::stream::once(async {
            Err::<axum::body::Bytes, std::io::Error>(std::io::Error::other("connection reset"))
        });
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/system/echo")
            .body(axum::body::Body::from_stream(stream))
            .unwrap();

        let status = echo_body(req, QueryParams::default()).await;

        assert_eq!(status.code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_system_docs_document_every_route() {
        let response = server().get("/system/docs").await;

        response.assert_status_ok();
        let text = response.text();
        assert!(text.starts_with("# Server API: system\n"));
        assert!(text.contains("## Health\n\n`GET`: `/system/health`"));
        assert!(text.contains("Example: `message=hello&repeat=2`"));
        assert!(text.contains("## EchoBody\n\n`POST`: `/system/echo`"));
    }
}
