//! Task module - the per-request state machine and the process-wide registry.
//!
//! One `TaskRecord` exists per submitted biography request. Records are
//! mutated only through validated transitions; terminal states are final.

mod record;
mod registry;

pub use record::{
    BiographyArtifacts, ImageAnalysis, QrCodeRef, TaskError, TaskId, TaskRecord, TaskStatus,
};
pub use registry::{InMemoryTaskRegistry, RegistryError, RegistryStats, TaskRegistry};
