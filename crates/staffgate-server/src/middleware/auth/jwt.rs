//! JWT encoding and decoding utilities.

use super::types::SessionClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Encode claims into a JWT token.
pub fn encode_token(claims: &SessionClaims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Decode and validate a JWT token.
pub fn decode_token(token: &str, secret: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;

    Ok(token_data.claims)
}

/// Holds the signing secret for the guard and for token issuance.
#[derive(Clone)]
pub struct TokenDecoder {
    secret: String,
}

impl TokenDecoder {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        decode_token(token, &self.secret)
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode_token(claims, &self.secret)
    }
}

impl std::fmt::Debug for TokenDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDecoder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;
    use staffgate_common_core::{PrincipalId, SessionId};

    const SECRET: &str = "test_secret_key_32_chars_long!!!";

    #[test]
    fn test_encode_decode() {
        let claims = SessionClaims::new(PrincipalId::new(), SessionId::new(), 3600);

        let token = encode_token(&claims, SECRET).unwrap();
        let decoded = decode_token(&token, SECRET).unwrap();

        assert_eq!(decoded, claims);
        assert!(!decoded.is_expired());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = SessionClaims::new(PrincipalId::new(), SessionId::new(), -3600);
        let token = encode_token(&claims, SECRET).unwrap();

        let err = decode_token(&token, SECRET).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = SessionClaims::new(PrincipalId::new(), SessionId::new(), 3600);
        let token = encode_token(&claims, SECRET).unwrap();

        assert!(decode_token(&token, "another_secret_another_secret_!!").is_err());
    }
}
