//! Middleware for the StaffGate API server.

pub mod auth;
pub mod guard;

pub use auth::{Auth, SessionCarrier, SessionClaims, TokenDecoder};
pub use guard::{compose, GuardLayer, GuardMiddleware, Pipeline, PipelineError};
