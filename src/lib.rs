//! # routebook
//!
//! Declarative HTTP route registration for axum services, with a generated
//! Markdown documentation page per route group and a built-in metrics
//! endpoint.
//!
//! ## Overview
//!
//! Services describe endpoints as data. A [`Route`] names an endpoint, gives
//! its method, path suffix, description and optional examples, and points at an
//! [`Endpoint`]. Routes are collected into [`HandlerGroup`]s, and
//! [`Handlers`] assembles them into an `axum::Router`:
//!
//! - `/<group>/<path>` for every declared route
//! - `GET /<group>/docs` for each group's Markdown page
//! - `GET /metrics` for request counters
//!
//! Any conflict in the table (duplicate group, route name, or method and path)
//! fails assembly instead of surfacing at request time.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use routebook::{Endpoint, Handlers, Route, RouteGroup, Status, example_of};
//! use axum::http::{Method, StatusCode};
//!
//! let users = RouteGroup::new("users").route(
//!     Route::new("Get", Method::GET, "/{id}", Endpoint::new(|_, _| {
//!         Status::ok(StatusCode::OK, User { id: 1, name: "a".into() })
//!     }))
//!     .with_description("Fetch one user.")
//!     .with_returns(example_of::<User>()),
//! );
//!
//! let router = Handlers::new().add(users).router()?;
//! // GET /users/1, GET /users/docs, GET /metrics
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Route descriptors, assembly, docs and metrics
//! - [`server`] - TCP transport with graceful shutdown
//! - [`cli`] - Command-line interface of `routebook-server`
//! - [`utils`] - TOML configuration
//! - [`types`] - Error types

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Route registration, documentation and metrics.
pub mod api;
/// Command-line interface.
pub mod cli;
/// HTTP transport.
pub mod server;
/// Error types.
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use api::endpoint::{Endpoint, QueryParams, Status};
pub use api::exampler::{Example, Exampler, example_of};
pub use api::handlers::system::SystemGroup;
pub use api::metrics::Metrics;
pub use api::route::{HandlerGroup, Route, RouteGroup};
pub use api::routes::{ApiRouter, Handlers, RouteInfo};
pub use server::Server;
pub use types::{Result, RouteError};
pub use utils::toml_config::RoutebookConfig;
