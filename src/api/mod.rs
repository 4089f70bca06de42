//! HTTP API for the biography agent.
//!
//! ## Endpoints
//!
//! - `POST /api/biography` - Submit photos + requirements, returns a task id
//! - `GET /api/biography/{id}/status` - Task status, progress and result
//! - `GET /api/biography/{id}/download` - Rendered document of a completed task
//! - `POST /api/biography/{id}/cancel` - Cancel an in-flight task
//! - `GET /api/ai/status` - Provider router failover state
//! - `POST /api/ai/reset` - Operator reset back to the primary provider
//! - `POST /api/ai/optimize` - One-shot text optimization
//! - `GET /api/health` - Health check
//! - `GET /api/stats` - Task counts

mod routes;
pub mod types;

pub use routes::{serve, AppState};
pub use types::*;
