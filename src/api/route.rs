//! Route descriptors and handler groups.
//!
//! A [`Route`] is an immutable description of one endpoint: what it is called,
//! where it lives, what it exchanges and which [`Endpoint`] serves it. The same
//! value drives dispatch and the generated documentation.

use crate::api::endpoint::Endpoint;
use crate::api::exampler::Exampler;
use axum::http::Method;
use std::fmt;
use std::sync::Arc;

/// Static description of one endpoint.
#[derive(Clone)]
pub struct Route {
    /// Unique within the group; used as the docs heading and route name.
    pub name: String,
    pub method: Method,
    /// Suffix below the group mount point, e.g. `/{id}` or empty.
    pub path: String,
    /// Rendered verbatim into documentation.
    pub description: String,
    /// Query parameter example.
    pub params: Option<Arc<dyn Exampler>>,
    /// Request body example.
    pub accepts: Option<Arc<dyn Exampler>>,
    /// Response body example.
    pub returns: Option<Arc<dyn Exampler>>,
    pub handler: Endpoint,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        handler: Endpoint,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            description: String::new(),
            params: None,
            accepts: None,
            returns: None,
            handler,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_params(mut self, params: Arc<dyn Exampler>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_accepts(mut self, accepts: Arc<dyn Exampler>) -> Self {
        self.accepts = Some(accepts);
        self
    }

    pub fn with_returns(mut self, returns: Arc<dyn Exampler>) -> Self {
        self.returns = Some(returns);
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params.is_some())
            .field("accepts", &self.accepts.is_some())
            .field("returns", &self.returns.is_some())
            .finish_non_exhaustive()
    }
}

// ============= Handler Groups =============

/// A named, ordered set of routes mounted under `/<name>/`.
///
/// Routes are read once when the router is assembled; their order is the
/// order of the generated documentation.
pub trait HandlerGroup: Send + Sync {
    fn name(&self) -> &str;
    fn routes(&self) -> Vec<Route>;
}

/// The plain data form of a [`HandlerGroup`].
#[derive(Debug, Clone)]
pub struct RouteGroup {
    name: String,
    routes: Vec<Route>,
}

impl RouteGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
        }
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }
}

impl HandlerGroup for RouteGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }
}

// ============= Path Composition =============

/// Join a group mount point and a route suffix.
///
/// Exactly one `/` separates segments, `.` segments and trailing slashes are
/// dropped, so `"foo"`, `"/foo"` and `"/foo/"` below `"bar"` all give
/// `"/bar/foo"`.
pub fn mount_path(group: &str, path: &str) -> String {
    let mut joined = String::with_capacity(group.len() + path.len() + 2);
    for segment in group
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
    {
        joined.push('/');
        joined.push_str(segment);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

/// Check that a route suffix is something the router can hold.
pub(crate) fn check_path(path: &str) -> Result<(), &'static str> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in segments.iter().enumerate() {
        if *segment == ".." {
            return Err("'..' segments would escape the group mount point");
        }
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err("placeholders use the {name} or {*rest} syntax");
        }
        let opens = segment.matches('{').count();
        let closes = segment.matches('}').count();
        if opens != closes || opens > 1 {
            return Err("each segment may hold at most one balanced {placeholder}");
        }
        if segment.contains("{}") || segment.contains("{*}") {
            return Err("placeholders must be named");
        }
        if segment.starts_with("{*") && i + 1 != segments.len() {
            return Err("a {*catch_all} placeholder must be the last segment");
        }
    }
    Ok(())
}

/// The path with placeholder names erased, e.g. `/users/{}`.
///
/// Two paths with the same shape are the same route to the router.
pub(crate) fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") && segment.ends_with('}') {
                "{*}"
            } else if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoint::Status;
    use axum::http::StatusCode;
    use rstest::rstest;
    use serde_json::json;

    fn noop() -> Endpoint {
        Endpoint::new(|_, _| Status::new(StatusCode::NO_CONTENT))
    }

    #[rstest]
    #[case("bar", "foo", "/bar/foo")]
    #[case("bar", "/foo", "/bar/foo")]
    #[case("bar", "/foo/", "/bar/foo")]
    #[case("bar", "//foo//baz", "/bar/foo/baz")]
    #[case("bar", "", "/bar")]
    #[case("bar", "/", "/bar")]
    #[case("bar", "./foo", "/bar/foo")]
    #[case("users", "/{id}", "/users/{id}")]
    fn test_mount_path(#[case] group: &str, #[case] path: &str, #[case] expected: &str) {
        assert_eq!(mount_path(group, path), expected);
    }

    #[rstest]
    #[case("/{id}")]
    #[case("/{id}/posts/{post_id}")]
    #[case("/files/{*rest}")]
    #[case("")]
    fn test_check_path_accepts(#[case] path: &str) {
        assert!(check_path(path).is_ok());
    }

    #[rstest]
    #[case("/../admin")]
    #[case("/:id")]
    #[case("/*rest")]
    #[case("/{id")]
    #[case("/{a}{b}")]
    #[case("/{*rest}/more")]
    #[case("/{}")]
    #[case("/files/{*}")]
    fn test_check_path_rejects(#[case] path: &str) {
        assert!(check_path(path).is_err());
    }

    #[test]
    fn test_path_shape_erases_placeholder_names() {
        assert_eq!(path_shape("/users/{id}"), path_shape("/users/{user_id}"));
        assert_eq!(path_shape("/files/{*rest}"), "/files/{*}");
        assert_ne!(path_shape("/users/{id}"), path_shape("/users/me"));
    }

    #[test]
    fn test_route_builder_sets_examples() {
        let route = Route::new("Get", Method::GET, "/{id}", noop())
            .with_description("Fetch one user")
            .with_returns(Arc::new(json!({"ID": 1})));

        assert_eq!(route.description, "Fetch one user");
        assert!(route.returns.is_some());
        assert!(route.params.is_none());
        assert!(route.accepts.is_none());
    }

    #[test]
    fn test_route_group_keeps_declared_order() {
        let group = RouteGroup::new("users")
            .route(Route::new("List", Method::GET, "", noop()))
            .route(Route::new("Create", Method::POST, "", noop()))
            .route(Route::new("Get", Method::GET, "/{id}", noop()));

        let names: Vec<String> = group.routes().into_iter().map(|r| r.name).collect();
        assert_eq!(group.name(), "users");
        assert_eq!(names, ["List", "Create", "Get"]);
    }
}
