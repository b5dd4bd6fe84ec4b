//! Endpoint adapter.
//!
//! Route handlers are plain functions from a request and its parsed query
//! string to a [`Status`]. [`Endpoint`] turns such a function into something
//! the router can dispatch to and owns the JSON envelope written back:
//!
//! ```json
//! { "result": <any, omitted if absent>, "error": "<string, omitted if absent>" }
//! ```

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

/// Boxed error carried by a failing [`Status`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const JSON_CONTENT_TYPE: &str = "application/json";
const ENCODE_FAILURE_BODY: &str = r#"{"error":"failed to encode response"}"#;

// ============= Query Parameters =============

/// Parsed query string with standard multi-value semantics.
///
/// `?tag=a&tag=b` keeps both values, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, Vec<String>>);

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed query string");
                Self::default()
            }
        }
    }

    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value for `key`, empty when the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in iter {
            map.entry(key).or_default().push(value);
        }
        Self(map)
    }
}

// ============= Status =============

/// Outcome of one endpoint invocation.
///
/// The HTTP code is chosen by the endpoint. An attached error is turned into
/// text only when the response is written, and is rendered even if a result
/// is also present.
#[derive(Debug)]
pub struct Status {
    code: StatusCode,
    result: Option<serde_json::Result<Value>>,
    error: Option<BoxError>,
}

impl Status {
    /// A status with neither result nor error; the body is `{}`.
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            result: None,
            error: None,
        }
    }

    /// Successful outcome carrying `result`.
    pub fn ok<T: Serialize>(code: StatusCode, result: T) -> Self {
        Self {
            code,
            result: Some(serde_json::to_value(result)),
            error: None,
        }
    }

    /// Failed outcome carrying `error`.
    pub fn err(code: StatusCode, error: impl Into<BoxError>) -> Self {
        Self {
            code,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Attach an error to an existing status, replacing any previous one.
    pub fn with_error(mut self, error: impl Into<BoxError>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Serialize)]
struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        let Status {
            code,
            result,
            error,
        } = self;

        let result = match result.transpose() {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, status = code.as_u16(), "Failed to encode endpoint result");
                return encode_failure();
            }
        };

        let envelope = Envelope {
            result,
            error: error.map(|e| e.to_string()).filter(|text| !text.is_empty()),
        };

        match serde_json::to_vec(&envelope) {
            Ok(body) => (
                code,
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, status = code.as_u16(), "Failed to encode response envelope");
                encode_failure()
            }
        }
    }
}

fn encode_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        ENCODE_FAILURE_BODY,
    )
        .into_response()
}

// ============= Endpoint =============

type EndpointFn = dyn Fn(Request, QueryParams) -> BoxFuture<'static, Status> + Send + Sync;

/// A dispatchable route handler built from a function returning [`Status`].
#[derive(Clone)]
pub struct Endpoint(Arc<EndpointFn>);

impl Endpoint {
    /// Wrap a plain synchronous function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Request, &QueryParams) -> Status + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |req: Request, query: QueryParams| -> BoxFuture<'static, Status> {
                let status = f(&req, &query);
                futures::future::ready(status).boxed()
            },
        ))
    }

    /// Wrap an async function that takes ownership of the request, for
    /// endpoints that read the body or extract path parameters.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, QueryParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Status> + Send + 'static,
    {
        Self(Arc::new(
            move |req: Request, query: QueryParams| -> BoxFuture<'static, Status> {
                f(req, query).boxed()
            },
        ))
    }

    /// Invoke the endpoint and encode its status.
    pub async fn call(&self, req: Request) -> Response {
        let query = QueryParams::from_uri(req.uri());
        (self.0)(req, query).await.into_response()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Endpoint")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use serde::ser::Error as _;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to encode"))
        }
    }

    #[test]
    fn test_query_params_keep_every_value() {
        let query = QueryParams::parse("tag=a&tag=b&name=x%20y");

        assert_eq!(query.len(), 2);
        assert_eq!(query.get("tag"), Some("a"));
        assert_eq!(query.get_all("tag"), ["a".to_string(), "b".to_string()]);
        assert_eq!(query.get("name"), Some("x y"));
        assert!(query.get_all("missing").is_empty());
    }

    #[test]
    fn test_query_params_from_uri_without_query() {
        let uri: Uri = "/users/1".parse().unwrap();
        assert!(QueryParams::from_uri(&uri).is_empty());
    }

    #[tokio::test]
    async fn test_ok_status_writes_result_only() {
        let endpoint = Endpoint::new(|_, _| Status::ok(StatusCode::OK, vec![1, 2, 3]));
        let response = endpoint.call(get("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_text(response).await, r#"{"result":[1,2,3]}"#);
    }

    #[tokio::test]
    async fn test_err_status_writes_error_text() {
        let endpoint = Endpoint::new(|_, _| Status::err(StatusCode::NOT_FOUND, "not found"));
        let response = endpoint.call(get("/")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, r#"{"error":"not found"}"#);
    }

    #[tokio::test]
    async fn test_error_is_rendered_alongside_result() {
        let endpoint = Endpoint::new(|_, _| {
            Status::ok(StatusCode::MULTI_STATUS, "partial").with_error("one item failed")
        });
        let response = endpoint.call(get("/")).await;

        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        assert_eq!(
            body_text(response).await,
            r#"{"result":"partial","error":"one item failed"}"#
        );
    }

    #[tokio::test]
    async fn test_empty_status_writes_empty_object() {
        let endpoint = Endpoint::new(|_, _| Status::new(StatusCode::ACCEPTED));
        let response = endpoint.call(get("/")).await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_text(response).await, "{}");
    }

    #[tokio::test]
    async fn test_unencodable_result_falls_back_to_500() {
        let endpoint = Endpoint::new(|_, _| Status::ok(StatusCode::OK, Unencodable));
        let response = endpoint.call(get("/")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            r#"{"error":"failed to encode response"}"#
        );
    }

    #[tokio::test]
    async fn test_endpoint_receives_parsed_query() {
        let endpoint = Endpoint::new(|_, query| {
            Status::ok(StatusCode::OK, query.get_all("id").to_vec())
        });
        let response = endpoint.call(get("/?id=1&id=2")).await;

        assert_eq!(body_text(response).await, r#"{"result":["1","2"]}"#);
    }

    #[tokio::test]
    async fn test_async_endpoint_reads_body() {
        let endpoint = Endpoint::from_async(|req: Request, _| async move {
            match to_bytes(req.into_body(), 1024).await {
                Ok(bytes) => Status::ok(StatusCode::CREATED, bytes.len()),
                Err(e) => Status::err(StatusCode::BAD_REQUEST, e),
            }
        });
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("hello"))
            .unwrap();
        let response = endpoint.call(req).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await, r#"{"result":5}"#);
    }
}
