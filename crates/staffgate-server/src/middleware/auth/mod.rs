//! Session carrier handling: cookie or bearer token to session id.

pub mod carrier;
pub mod extractor;
pub mod jwt;
pub mod types;

pub use carrier::SessionCarrier;
pub use extractor::Auth;
pub use jwt::{decode_token, encode_token, TokenDecoder};
pub use types::SessionClaims;
