//! StaffGate common core types.

pub mod id;

pub use id::{FacilityId, IdParseError, PrincipalId, RequestId, SessionId};
