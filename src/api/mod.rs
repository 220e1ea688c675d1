//! API layer
//!
//! HTTP handlers for:
//! - Protected user endpoints
//! - Admin API
//! - Metrics (Prometheus)

mod admin;
pub mod metrics;
mod user;

pub use admin::{SetValueRequest, StatusResponse, admin_router};
pub use metrics::metrics_router;
pub use user::{Album, UserValueResponse, user_router};
