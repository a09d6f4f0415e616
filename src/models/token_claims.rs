use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminates what a signed token may be used for. Carried inside the
/// claims as `token_type` so a token minted for one flow cannot be replayed
/// into another whose claim shape happens to overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    EmailVerification,
    PasswordReset,
}

/// Claims types that carry a purpose tag. The codec refuses to hand out
/// claims whose tag does not match the type they are parsed into.
pub trait PurposedClaims {
    const PURPOSE: TokenPurpose;

    fn purpose(&self) -> TokenPurpose;
}

/// Claims carried by a short-lived access token. The `access_uuid` ties the
/// token to its liveness entry in the cache store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub token_type: TokenPurpose,
    pub authorized: bool,
    pub account_id: String,
    pub access_uuid: String,
    pub email: String,
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(account_id: &str, email: &str, ttl_minutes: i64) -> Self {
        AccessClaims {
            token_type: TokenPurpose::Access,
            authorized: true,
            account_id: account_id.to_string(),
            access_uuid: Uuid::new_v4().to_string(),
            email: email.to_string(),
            exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
        }
    }
}

impl PurposedClaims for AccessClaims {
    const PURPOSE: TokenPurpose = TokenPurpose::Access;

    fn purpose(&self) -> TokenPurpose {
        self.token_type
    }
}

/// Claims carried by a refresh token, used solely to mint a new pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub token_type: TokenPurpose,
    pub account_id: String,
    pub refresh_uuid: String,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn new(account_id: &str, ttl_minutes: i64) -> Self {
        RefreshClaims {
            token_type: TokenPurpose::Refresh,
            account_id: account_id.to_string(),
            refresh_uuid: Uuid::new_v4().to_string(),
            exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
        }
    }
}

impl PurposedClaims for RefreshClaims {
    const PURPOSE: TokenPurpose = TokenPurpose::Refresh;

    fn purpose(&self) -> TokenPurpose {
        self.token_type
    }
}

/// Single-purpose email verification claims. Valid by signature and expiry
/// alone, never tracked in the cache store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClaims {
    pub token_type: TokenPurpose,
    pub account_id: String,
    pub email: String,
    pub exp: i64,
}

impl EmailClaims {
    pub fn new(account_id: &str, email: &str, ttl_minutes: i64) -> Self {
        EmailClaims {
            token_type: TokenPurpose::EmailVerification,
            account_id: account_id.to_string(),
            email: email.to_string(),
            exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
        }
    }
}

impl PurposedClaims for EmailClaims {
    const PURPOSE: TokenPurpose = TokenPurpose::EmailVerification;

    fn purpose(&self) -> TokenPurpose {
        self.token_type
    }
}

/// Single-purpose password reset claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub token_type: TokenPurpose,
    pub email: String,
    pub exp: i64,
}

impl ResetClaims {
    pub fn new(email: &str, ttl_minutes: i64) -> Self {
        ResetClaims {
            token_type: TokenPurpose::PasswordReset,
            email: email.to_string(),
            exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
        }
    }
}

impl PurposedClaims for ResetClaims {
    const PURPOSE: TokenPurpose = TokenPurpose::PasswordReset;

    fn purpose(&self) -> TokenPurpose {
        self.token_type
    }
}

/// An issued access/refresh pair together with the bookkeeping the session
/// manager needs to register and later revoke it.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip)]
    pub access_uuid: String,
    #[serde(skip)]
    pub refresh_uuid: String,
    #[serde(skip)]
    pub access_exp: i64,
    #[serde(skip)]
    pub refresh_exp: i64,
}
