//! Markdown documentation pages generated from route descriptors.
//!
//! Every group gets a `GET /<group>/docs` page rendered fresh on each request
//! from the same [`Route`] values that drive dispatch. The page layout is
//! fixed; tooling parses these pages, so headings and section order must not
//! drift:
//!
//! ```text
//! ## <route name>
//!
//! `<METHOD>`: `/<group>/<path>`
//!
//! <description>
//!
//! ### Query parameters        (only if params present)
//! ### Accepts                 (only if accepts present)
//! ### Returns                 (only if returns present)
//! ```
//!
//! JSON blocks are indented with four spaces and object keys are emitted in
//! lexical order.

use crate::api::exampler::Exampler;
use crate::api::route::{Route, mount_path};
use crate::types::{DocsError, ExampleError};
use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fmt::Write;
use std::sync::Arc;
use tracing::error;

/// Content type of a served docs page.
pub const CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// A rendered page, possibly truncated.
#[derive(Debug)]
pub struct DocsPage {
    pub text: String,
    /// Set when an example failed; `text` stops before the failing route.
    pub error: Option<DocsError>,
}

impl DocsPage {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Render the documentation page for one group.
pub fn render(group: &str, routes: &[Route]) -> DocsPage {
    let mut text = String::new();
    let error = render_into(&mut text, group, routes).err();
    DocsPage { text, error }
}

/// Render into `out`, stopping at the first route whose example fails.
///
/// Output already written stays written.
pub fn render_into<W: Write>(out: &mut W, group: &str, routes: &[Route]) -> Result<(), DocsError> {
    write!(
        out,
        "# Server API: {group}\n\n\
         This is an automatically generated documentation page for the {group} API endpoints.\n\n"
    )?;

    for route in routes {
        render_route(out, group, route)?;
    }
    Ok(())
}

/// Serve a freshly rendered page for `group`.
///
/// A truncated page is still served; the failure is logged for operators.
pub(crate) fn respond(group: &str, routes: &[Route]) -> Response {
    let page = render(group, routes);
    if let Some(err) = &page.error {
        error!(group, error = %err, "Documentation page truncated");
    }
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE))],
        page.text,
    )
        .into_response()
}

fn render_route<W: Write>(out: &mut W, group: &str, route: &Route) -> Result<(), DocsError> {
    let example_failed = |source: ExampleError| DocsError::Example {
        route: route.name.clone(),
        source,
    };

    // Examples are encoded up front so a failure leaves no half-written block.
    let params = route
        .params
        .as_ref()
        .map(|p| p.example().and_then(|v| encode_query(&v)))
        .transpose()
        .map_err(example_failed)?;
    let accepts = route
        .accepts
        .as_ref()
        .map(indented_example)
        .transpose()
        .map_err(example_failed)?;
    let returns = route
        .returns
        .as_ref()
        .map(indented_example)
        .transpose()
        .map_err(example_failed)?;

    write!(
        out,
        "## {name}\n\n`{method}`: `{path}`\n\n{description}\n",
        name = route.name,
        method = route.method,
        path = mount_path(group, &route.path),
        description = route.description,
    )?;

    if let Some(query) = params {
        write!(out, "\n### Query parameters\n\nExample: `{query}`\n")?;
    }
    if let Some(json) = accepts {
        write!(out, "\n### Accepts\n\n```json\n{json}\n```\n")?;
    }
    if let Some(json) = returns {
        write!(out, "\n### Returns\n\n```json\n{json}\n```\n")?;
    }
    out.write_char('\n')?;
    Ok(())
}

fn indented_example(exampler: &Arc<dyn Exampler>) -> Result<String, ExampleError> {
    to_indented_json(&exampler.example()?)
}

/// Serialize `value` as JSON indented with four spaces, keys in lexical order.
pub fn to_indented_json(value: &Value) -> Result<String, ExampleError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    sort_keys(value.clone()).serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// serde_json's map order depends on its `preserve_order` feature.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Encode an example as a query string.
///
/// The example must be an object (or `null`, giving an empty string). Scalar
/// members become `key=value`, arrays of scalars become repeated keys and
/// `null` members are skipped.
pub fn encode_query(value: &Value) -> Result<String, ExampleError> {
    let object = match value {
        Value::Null => return Ok(String::new()),
        Value::Object(object) => object,
        other => {
            return Err(ExampleError::Query(format!(
                "expected an object, found {}",
                kind(other)
            )));
        }
    };

    let mut pairs: Vec<(&str, String)> = Vec::with_capacity(object.len());
    for (key, member) in object {
        match member {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.as_str(), scalar(key, item)?));
                }
            }
            other => pairs.push((key.as_str(), scalar(key, other)?)),
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(b.0));
    serde_urlencoded::to_string(&pairs).map_err(|e| ExampleError::Query(e.to_string()))
}

fn scalar(key: &str, value: &Value) -> Result<String, ExampleError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ExampleError::Query(format!(
            "'{key}' holds {}, which has no query string form",
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
