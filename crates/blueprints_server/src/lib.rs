//! HTTP service exposing blueprint storage over a JSON REST API.

pub mod api;
pub mod configuration;
pub mod pool;
pub mod server;

pub use api::{route_request, ServerState};
pub use configuration::Config;
pub use pool::{build_pool, DbPool};
