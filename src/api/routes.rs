use crate::api::docs;
use crate::api::metrics::{self, Metrics};
use crate::api::route::{HandlerGroup, Route, check_path, mount_path, path_shape};
use crate::types::{Result, RouteError};
use axum::{
    Router,
    extract::Request,
    handler::Handler,
    http::Method,
    middleware,
    response::Response,
    routing::{MethodFilter, MethodRouter},
};
use futures::FutureExt;
use futures::future::BoxFuture;
use matchit::InsertError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Segment of the documentation route synthesized for every group.
pub const DOCS_ROUTE: &str = "docs";
/// Process-wide metrics route, outside any group.
pub const METRICS_PATH: &str = "/metrics";

const RESERVED_GROUPS: &[&str] = &["metrics"];

/// Identity of the route that produced a response.
///
/// Attached to response extensions so middleware can label by route instead
/// of by raw path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteName {
    pub group: Option<Arc<str>>,
    pub name: Arc<str>,
}

impl RouteName {
    pub fn new(group: Option<&str>, name: &str) -> Self {
        Self {
            group: group.map(Arc::from),
            name: Arc::from(name),
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}/{}", group, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// One entry of the assembled route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub group: Option<String>,
    pub name: String,
    pub method: String,
    pub path: String,
    pub description: String,
}

// ============= Handlers =============

/// Every route group of a service, keyed by mount segment.
#[derive(Clone, Default)]
pub struct Handlers {
    groups: Vec<(String, Arc<dyn HandlerGroup>)>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `group` under `/<name>/`.
    pub fn mount(self, name: impl Into<String>, group: impl HandlerGroup + 'static) -> Self {
        self.mount_shared(name, Arc::new(group))
    }

    pub fn mount_shared(mut self, name: impl Into<String>, group: Arc<dyn HandlerGroup>) -> Self {
        self.groups.push((name.into(), group));
        self
    }

    /// Mount `group` under its own name.
    pub fn add(self, group: impl HandlerGroup + 'static) -> Self {
        let name = group.name().to_string();
        self.mount(name, group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Build the dispatchable router with a fresh metrics registry.
    pub fn router(&self) -> Result<Router> {
        Ok(self.assemble(Arc::new(Metrics::new()))?.into_router())
    }

    /// Build the dispatchable router and its route table.
    ///
    /// Every group's routes are mounted under `/<group>/<path>`, followed by a
    /// synthesized `GET /<group>/docs`; `GET /metrics` comes last. Any
    /// conflict fails the whole assembly.
    pub fn assemble(&self, metrics: Arc<Metrics>) -> Result<ApiRouter> {
        let mut registry = Registry::default();
        let mut mounted: HashSet<&str> = HashSet::new();

        for (group, handler_group) in &self.groups {
            check_group_name(group)?;
            if !mounted.insert(group) {
                return Err(RouteError::DuplicateGroup(group.clone()));
            }

            let routes = handler_group.routes();
            // The synthesized docs route takes part in name uniqueness.
            let mut names: HashSet<&str> = HashSet::from([DOCS_ROUTE]);

            for route in &routes {
                if !names.insert(&route.name) {
                    return Err(RouteError::DuplicateRouteName {
                        group: group.clone(),
                        name: route.name.clone(),
                    });
                }
                check_path(&route.path).map_err(|reason| RouteError::InvalidPath {
                    group: group.clone(),
                    route: route.name.clone(),
                    path: route.path.clone(),
                    reason: reason.to_string(),
                })?;
                let filter = MethodFilter::try_from(route.method.clone()).map_err(|_| {
                    RouteError::UnsupportedMethod {
                        group: group.clone(),
                        route: route.name.clone(),
                        method: route.method.clone(),
                    }
                })?;

                registry.register(
                    Entry {
                        name: RouteName::new(Some(group.as_str()), &route.name),
                        method: route.method.clone(),
                        filter,
                        path: mount_path(group, &route.path),
                        description: route.description.clone(),
                    },
                    endpoint_handler(route, RouteName::new(Some(group.as_str()), &route.name)),
                )?;
            }

            let name = RouteName::new(Some(group.as_str()), DOCS_ROUTE);
            registry.register(
                Entry {
                    name: name.clone(),
                    method: Method::GET,
                    filter: MethodFilter::GET,
                    path: mount_path(group, DOCS_ROUTE),
                    description: format!("Documentation for the {group} API endpoints."),
                },
                docs_handler(group, routes, name),
            )?;
        }

        let name = RouteName::new(None, "metrics");
        registry.register(
            Entry {
                name: name.clone(),
                method: Method::GET,
                filter: MethodFilter::GET,
                path: METRICS_PATH.to_string(),
                description: "Request metrics in the Prometheus text format.".to_string(),
            },
            metrics_handler(metrics.clone(), name),
        )?;

        let Registry { paths, table, .. } = registry;
        let router = paths
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            })
            .route_layer(middleware::from_fn_with_state(metrics.clone(), metrics::track));

        info!(
            groups = self.groups.len(),
            routes = table.len(),
            "Assembled router"
        );

        Ok(ApiRouter {
            router,
            routes: table,
            metrics,
        })
    }
}

impl FromIterator<(String, Arc<dyn HandlerGroup>)> for Handlers {
    fn from_iter<I: IntoIterator<Item = (String, Arc<dyn HandlerGroup>)>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.groups.iter().map(|(name, _)| name))
            .finish()
    }
}

/// An assembled router together with its route table.
#[derive(Debug)]
pub struct ApiRouter {
    router: Router,
    routes: Vec<RouteInfo>,
    metrics: Arc<Metrics>,
}

impl ApiRouter {
    /// Route table in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

// ============= Registration =============

struct Entry {
    name: RouteName,
    method: Method,
    filter: MethodFilter,
    path: String,
    description: String,
}

#[derive(Default)]
struct Registry {
    /// Method routers by literal path, in first-registration order.
    paths: Vec<(String, MethodRouter)>,
    /// Every literal path, held by the matcher axum routes with. A path it
    /// refuses here would make `Router::route` panic.
    matcher: matchit::Router<()>,
    /// Owner of each (method, path shape).
    claimed: HashMap<(Method, String), RouteName>,
    /// Literal path first registered for each shape.
    shapes: HashMap<String, String>,
    table: Vec<RouteInfo>,
}

impl Registry {
    fn register<H, T>(&mut self, entry: Entry, handler: H) -> Result<()>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let shape = path_shape(&entry.path);

        if let Some(existing) = self.shapes.get(&shape)
            && *existing != entry.path
        {
            return Err(RouteError::ConflictingPath {
                path: entry.path,
                existing: existing.clone(),
            });
        }

        if let Some(first) = self.claimed.get(&(entry.method.clone(), shape.clone())) {
            return Err(RouteError::DuplicateRoute {
                method: entry.method,
                path: entry.path,
                first: first.to_string(),
                second: entry.name.to_string(),
            });
        }

        let is_new_path = !self.paths.iter().any(|(path, _)| *path == entry.path);
        if is_new_path {
            self.matcher
                .insert(entry.path.clone(), ())
                .map_err(|err| match err {
                    InsertError::Conflict { with } => RouteError::ConflictingPath {
                        path: entry.path.clone(),
                        existing: with,
                    },
                    other => RouteError::InvalidPath {
                        group: entry.name.group.as_deref().unwrap_or_default().to_string(),
                        route: entry.name.name.to_string(),
                        path: entry.path.clone(),
                        reason: other.to_string(),
                    },
                })?;
        }

        debug!(
            method = %entry.method,
            path = %entry.path,
            route = %entry.name,
            "Registered route"
        );

        self.claimed
            .insert((entry.method.clone(), shape.clone()), entry.name.clone());
        self.shapes.insert(shape, entry.path.clone());

        match self.paths.iter_mut().find(|(path, _)| *path == entry.path) {
            Some((_, method_router)) => {
                let merged = std::mem::replace(method_router, MethodRouter::new());
                *method_router = merged.on(entry.filter, handler);
            }
            None => self
                .paths
                .push((entry.path.clone(), MethodRouter::new().on(entry.filter, handler))),
        }

        self.table.push(RouteInfo {
            group: entry.name.group.as_deref().map(str::to_string),
            name: entry.name.name.to_string(),
            method: entry.method.to_string(),
            path: entry.path,
            description: entry.description,
        });
        Ok(())
    }
}

fn check_group_name(name: &str) -> Result<()> {
    let invalid = |reason| RouteError::InvalidGroupName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be a relative path segment"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    {
        return Err(invalid(
            "only ASCII letters, digits, '-', '.', '_' and '~' are allowed",
        ));
    }
    if RESERVED_GROUPS.contains(&name) {
        return Err(RouteError::ReservedGroupName(name.to_string()));
    }
    Ok(())
}

// ============= Handlers bound into the router =============

fn endpoint_handler(
    route: &Route,
    name: RouteName,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    let endpoint = route.handler.clone();
    move |req: Request| {
        let endpoint = endpoint.clone();
        let name = name.clone();
        async move {
            let mut response = endpoint.call(req).await;
            response.extensions_mut().insert(name);
            response
        }
        .boxed()
    }
}

fn docs_handler(
    group: &str,
    routes: Vec<Route>,
    name: RouteName,
) -> impl Fn() -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    let group: Arc<str> = Arc::from(group);
    let routes: Arc<[Route]> = routes.into();
    move || {
        let mut response = docs::respond(&group, &routes);
        response.extensions_mut().insert(name.clone());
        futures::future::ready(response).boxed()
    }
}

fn metrics_handler(
    metrics: Arc<Metrics>,
    name: RouteName,
) -> impl Fn() -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move || {
        let mut response = metrics::respond(&metrics);
        response.extensions_mut().insert(name.clone());
        futures::future::ready(response).boxed()
    }
}
