use crate::models::account::{Account, AccountFilter, Profile};
use crate::models::response::AuthResponse;
use crate::repository::database::{AccountStore, ProfileStore, StoreError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use std::sync::Arc;
use thiserror::Error;

type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("An error occurred")]
    Store(#[source] StoreError),
}

impl ProfileError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ProfileError::NotFound => "not_found",
            ProfileError::InvalidInput(_) => "invalid_input",
            ProfileError::Store(_) => "internal_server_error",
        }
    }
}

impl From<StoreError> for ProfileError {
    fn from(err: StoreError) -> Self {
        ProfileError::Store(err)
    }
}

impl ResponseError for ProfileError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProfileError::NotFound => StatusCode::NOT_FOUND,
            ProfileError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProfileError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error surfaced to caller: {:?}", self);
        }

        HttpResponse::build(self.status_code()).json(AuthResponse {
            error_type: self.error_type().to_string(),
            message: self.to_string(),
        })
    }
}

/// Reads and updates the display profile attached to an account. The email
/// shown alongside the profile comes from the account record, so both stores
/// are consulted on a read.
#[derive(Clone)]
pub struct ProfileService {
    accounts: Arc<dyn AccountStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(accounts: Arc<dyn AccountStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        ProfileService { accounts, profiles }
    }

    pub async fn get_profile(&self, account_id: &str) -> Result<(Profile, Account)> {
        let account = self
            .accounts
            .get_account(AccountFilter::Id(account_id.to_string()))
            .await?
            .ok_or(ProfileError::NotFound)?;

        let profile = self
            .profiles
            .get_profile(&account.account_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        Ok((profile, account))
    }

    pub async fn update_full_name(&self, account_id: &str, full_name: &str) -> Result<()> {
        let updated = self.profiles.update_full_name(account_id, full_name).await?;
        if updated == 0 {
            return Err(ProfileError::NotFound);
        }
        Ok(())
    }
}
