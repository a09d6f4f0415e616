use crate::models::token_claims::{AccessClaims, PurposedClaims, RefreshClaims};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

type Result<T> = std::result::Result<T, TokenError>;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("error signing the token : {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("token is invalid : {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("token is expired")]
    Expired,
    #[error("token was issued for a different purpose")]
    WrongPurpose,
}

/// Creates and parses HS256 signed claims over a single process-wide secret.
/// Pure over the secret, safe to clone into every request handler.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        TokenCodec {
            secret: secret.to_string(),
        }
    }

    pub fn create_token<T: Serialize>(&self, claims: &T) -> Result<String> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(TokenError::Signing)
    }

    /// Verifies signature and expiry. Expired-but-well-signed tokens are a
    /// distinct error because callers react by refreshing instead of
    /// rejecting outright.
    pub fn parse_token<T: DeserializeOwned + PurposedClaims>(&self, token: &str) -> Result<T> {
        self.decode(token, Validation::new(Algorithm::HS256))
    }

    /// Same as [`parse_token`](Self::parse_token) but tolerates a past
    /// expiry. Used on sign-out, where an expired access token must still be
    /// parseable so its cache entry can be removed.
    pub fn parse_token_allow_expired<T: DeserializeOwned + PurposedClaims>(
        &self,
        token: &str,
    ) -> Result<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        self.decode(token, validation)
    }

    /// Signs both halves of a session. Fails atomically: no partial pair is
    /// ever returned.
    pub fn create_token_pair(
        &self,
        access: &AccessClaims,
        refresh: &RefreshClaims,
    ) -> Result<(String, String)> {
        let access_token = self.create_token(access)?;
        let refresh_token = self.create_token(refresh)?;
        Ok((access_token, refresh_token))
    }

    /// Signature and structural checks first, then the purpose tag. The tag
    /// check is what stops a token from one flow being replayed into another
    /// flow whose claim fields it happens to satisfy.
    fn decode<T: DeserializeOwned + PurposedClaims>(
        &self,
        token: &str,
        validation: Validation,
    ) -> Result<T> {
        let decoded = jsonwebtoken::decode::<T>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e),
        })?;

        if decoded.claims.purpose() != T::PURPOSE {
            return Err(TokenError::WrongPurpose);
        }

        Ok(decoded.claims)
    }
}
