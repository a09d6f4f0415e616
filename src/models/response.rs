use crate::models::account::{Account, Profile};
use crate::models::post::Post;
use serde::Serialize;

/// Machine-readable error envelope. Clients branch on `error_type` (for
/// example `token_expired` drives a silent refresh), never on the prose.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FilteredAccount {
    pub account_id: String,
    pub email: String,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    #[serde(rename = "createdAt")]
    pub created_at: Option<chrono::NaiveDateTime>,
}

impl FilteredAccount {
    pub fn from_account(account: &Account) -> Self {
        FilteredAccount {
            account_id: account.account_id.to_owned(),
            email: account.email.to_owned(),
            is_verified: account.is_verified,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub message: String,
    pub account: FilteredAccount,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub post_list: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub image_url: String,
}
