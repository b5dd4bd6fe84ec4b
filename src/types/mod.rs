use axum::http::Method;

// ============= Configuration Errors =============

/// Errors raised while assembling route groups into a router.
///
/// Every variant is a start-up problem: the process must not start serving
/// with a route table that produced one of these.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid group name '{name}': {reason}")]
    InvalidGroupName { name: String, reason: &'static str },

    #[error("Group name '{0}' is reserved")]
    ReservedGroupName(String),

    #[error("Group '{0}' is mounted more than once")]
    DuplicateGroup(String),

    #[error("Route '{route}' in group '{group}' has an invalid path '{path}': {reason}")]
    InvalidPath {
        group: String,
        route: String,
        path: String,
        reason: String,
    },

    #[error("Route '{route}' in group '{group}' uses unsupported method {method}")]
    UnsupportedMethod {
        group: String,
        route: String,
        method: Method,
    },

    #[error("Route name '{name}' is declared more than once in group '{group}'")]
    DuplicateRouteName { group: String, name: String },

    #[error("{method} {path} is registered by both {first} and {second}")]
    DuplicateRoute {
        method: Method,
        path: String,
        first: String,
        second: String,
    },

    #[error("Path {path} conflicts with {existing}: placeholders must use the same names")]
    ConflictingPath { path: String, existing: String },
}

// ============= Documentation Errors =============

/// Errors raised while producing an example value for documentation.
#[derive(Debug, thiserror::Error)]
pub enum ExampleError {
    #[error("Failed to build example: {0}")]
    Build(String),

    #[error("Failed to encode example as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode example as a query string: {0}")]
    Query(String),
}

/// Errors that truncate a rendered documentation page.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("Example for route '{route}' failed: {source}")]
    Example {
        route: String,
        #[source]
        source: ExampleError,
    },

    #[error("Failed to write documentation: {0}")]
    Write(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;
