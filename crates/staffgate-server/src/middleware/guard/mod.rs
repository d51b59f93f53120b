//! Per-route guard: the composed authorization and audit pipeline.

pub mod layer;
pub mod pipeline;

pub use layer::{GuardLayer, GuardMiddleware};
pub use pipeline::{audit, compose, require_auth, require_facility_param, require_permission, AuditSpec, Pipeline, PipelineError, Stage};
