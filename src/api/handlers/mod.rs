//! Route groups shipped with the server.

/// Health and echo endpoints.
pub mod system;
