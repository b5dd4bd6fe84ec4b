//! Declarative HTTP routing
//!
//! Services describe their endpoints as [`route::Route`] values collected into
//! [`route::HandlerGroup`]s. [`routes::Handlers`] mounts every group under
//! `/<group>/`, adds a generated Markdown page at `/<group>/docs` and a
//! process-wide `/metrics` endpoint, and refuses to build a router from a
//! conflicting table.
//!
//! # Module Structure
//!
//! - [`exampler`] - Example values shown in documentation
//! - [`endpoint`] - Adapter from `Status`-returning functions to handlers
//! - [`route`] - Route descriptors and handler groups
//! - [`routes`] - Router assembly
//! - [`docs`] - Markdown documentation renderer
//! - [`metrics`] - Request counters and the exposition endpoint
//! - [`handlers`] - Built-in route groups

/// Markdown documentation pages.
pub mod docs;
/// Endpoint adapter and response envelope.
pub mod endpoint;
/// Documentation examples.
pub mod exampler;
/// Built-in route groups.
pub mod handlers;
/// Request metrics.
pub mod metrics;
/// Route descriptors.
pub mod route;
/// Router assembly.
pub mod routes;
