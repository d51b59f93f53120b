//! Error handling for the StaffGate API server.

pub mod response;
pub mod types;

pub use types::{ApiError, ApiResult};
