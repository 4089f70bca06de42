//! # biography-agent
//!
//! Asynchronous photo-biography generation service.
//!
//! Callers upload photos plus free-text requirements; a background pipeline
//! analyzes the photos, generates a validated biography through an external
//! multimodal AI provider, and renders the final document. Submission
//! returns a task id immediately; callers poll for status.
//!
//! ## Architecture
//!
//! ```text
//!  POST /api/biography
//!        │
//!        ▼
//!  ┌──────────────┐   spawn   ┌───────────────────────────────┐
//!  │ Orchestrator │──────────▶│ pipeline (5 sequential stages) │
//!  └──────┬───────┘           └──────────────┬────────────────┘
//!         │                                  │
//!         ▼                                  ▼
//!  ┌──────────────┐           ┌───────────────────────────────┐
//!  │ TaskRegistry │◀──────────│ ProviderRouter (primary/backup)│
//!  └──────────────┘  updates  └───────────────────────────────┘
//! ```
//!
//! ## Modules
//! - `llm`: provider clients and the failover router
//! - `content`: life segments, prompts, and output validation
//! - `task`: the per-request state machine and registry
//! - `pipeline`: the orchestrator and stage driver
//! - `render`: the document rendering boundary
//! - `api`: the HTTP surface

pub mod api;
pub mod config;
pub mod content;
pub mod files;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod task;

pub use config::Config;
pub use llm::{ProviderRouter, FAILOVER_THRESHOLD};
pub use pipeline::Orchestrator;
pub use task::{TaskId, TaskRecord, TaskStatus};
