use crate::config::config::Config;
use crate::models::account::{Account, AccountFilter, Profile};
use crate::models::response::AuthResponse;
use crate::models::token_claims::{
    AccessClaims, EmailClaims, RefreshClaims, ResetClaims, TokenPair,
};
use crate::repository::database::{AccountStore, ProfileStore, StoreError};
use crate::repository::redis::{CacheError, CacheStore};
use crate::util::password;
use crate::util::password::PasswordError;
use crate::util::send_email::{
    reset_password_email_body, verification_email_body, MailError, MailSender,
};
use crate::util::token::{TokenCodec, TokenError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use log::{error, warn};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("You are not logged in, please provide a token")]
    MissingToken,
    #[error("Token is invalid")]
    TokenInvalid,
    #[error("Token is expired")]
    TokenExpired,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Email has not been verified")]
    EmailNotVerified,
    #[error("Email has already been used")]
    DuplicateEmail,
    #[error("Account not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("An error occurred")]
    Store(#[source] StoreError),
    #[error("An error occurred")]
    Cache(#[source] CacheError),
    #[error("An error occurred")]
    Mail(#[source] MailError),
    #[error("An error occurred")]
    Token(#[source] TokenError),
    #[error("An error occurred")]
    Password(#[source] PasswordError),
}

impl AuthError {
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingToken | AuthError::Unauthorized => "unauthorized",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::EmailNotVerified => "email_not_verified",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::NotFound => "not_found",
            AuthError::InvalidInput(_) => "invalid_input",
            _ => "internal_server_error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid(_) | TokenError::WrongPurpose => AuthError::TokenInvalid,
            TokenError::Signing(_) => AuthError::Token(err),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            err => AuthError::Store(err),
        }
    }
}

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        AuthError::Cache(err)
    }
}

impl From<MailError> for AuthError {
    fn from(err: MailError) -> Self {
        AuthError::Mail(err)
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Password(err)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
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

/// Orchestrates the session lifecycle (login, logout, refresh) and the
/// email-verification / password-reset token flows. All collaborators are
/// injected so tests can substitute in-memory fakes.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    profiles: Arc<dyn ProfileStore>,
    cache: Arc<dyn CacheStore>,
    mailer: Arc<dyn MailSender>,
    codec: TokenCodec,
    config: Config,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        profiles: Arc<dyn ProfileStore>,
        cache: Arc<dyn CacheStore>,
        mailer: Arc<dyn MailSender>,
        codec: TokenCodec,
        config: Config,
    ) -> Self {
        AuthService {
            accounts,
            profiles,
            cache,
            mailer,
            codec,
            config,
        }
    }

    /// Password check, then token-pair issuance and cache registration.
    /// Unknown email and wrong password collapse into one error kind so the
    /// response never reveals which field was wrong.
    pub async fn login(&self, email: &str, password_input: &str) -> Result<TokenPair> {
        let account = match self
            .accounts
            .get_account(AccountFilter::Email(email.to_string()))
            .await?
        {
            Some(account) => account,
            None => {
                warn!("login attempt for unknown email: {}", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !password::compare_password(password_input, &account.password) {
            warn!("incorrect password for email: {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        self.issue_session(&account).await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password_input: &str,
        full_name: &str,
    ) -> Result<(Account, Profile)> {
        let salt = password::generate_salt()?;
        let hash = password::hash_password(password_input, &salt)?;

        let account_id = Uuid::new_v4().to_string();
        let email_claims = EmailClaims::new(&account_id, email, self.config.email_token_max_age);
        let email_token = self.codec.create_token(&email_claims)?;

        let now = Utc::now().naive_utc();
        let account = Account {
            account_id,
            email: email.to_string(),
            password: hash,
            salt,
            is_verified: false,
            email_token: Some(email_token.clone()),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let inserted = self.accounts.insert_account(account).await?;

        let profile = Profile {
            profile_id: Uuid::new_v4().to_string(),
            account_id: inserted.account_id.clone(),
            full_name: full_name.to_string(),
        };
        self.profiles.insert_profile(&profile).await?;

        let url = format!(
            "{}/api/auth/verify_email?token={}",
            self.config.host, email_token
        );
        self.mailer
            .send_mail(
                std::slice::from_ref(&inserted.email),
                &self.config.email_verification_subject,
                &verification_email_body(&url),
            )
            .await?;

        Ok((inserted, profile))
    }

    /// Signature+expiry check only; re-submitting an already-consumed token
    /// is a harmless no-op.
    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let claims: EmailClaims = self.codec.parse_token(token)?;

        let account = self
            .accounts
            .get_account(AccountFilter::Email(claims.email))
            .await?
            .ok_or(AuthError::NotFound)?;

        self.accounts
            .update_is_verified(&account.account_id, true)
            .await?;

        Ok(())
    }

    /// A missing account surfaces as `NotFound`; the delivery layer swallows
    /// that into a 200 so callers cannot enumerate registered emails.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        let account = self
            .accounts
            .get_account(AccountFilter::Email(email.to_string()))
            .await?
            .ok_or(AuthError::NotFound)?;

        if !account.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let claims = ResetClaims::new(&account.email, self.config.reset_token_max_age);
        let token = self.codec.create_token(&claims)?;

        let url = format!(
            "{}/api/auth/change_password?token={}",
            self.config.host, token
        );
        self.mailer
            .send_mail(
                std::slice::from_ref(&account.email),
                &self.config.reset_password_subject,
                &reset_password_email_body(&url),
            )
            .await?;

        Ok(())
    }

    /// Existing live sessions are left untouched; only the stored credential
    /// changes.
    pub async fn change_password(&self, token: &str, new_password: &str) -> Result<()> {
        let claims: ResetClaims = self.codec.parse_token(token)?;

        let mut account = self
            .accounts
            .get_account(AccountFilter::Email(claims.email))
            .await?
            .ok_or(AuthError::NotFound)?;

        account.salt = password::generate_salt()?;
        account.password = password::hash_password(new_password, &account.salt)?;

        self.accounts.update_salt_and_password(&account).await?;

        Ok(())
    }

    /// Removes both liveness entries. The access token may already be
    /// expired; the refresh token must still verify. Deleting absent keys is
    /// not an error, so signing out twice is fine.
    pub async fn sign_out(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        let access: AccessClaims = self.codec.parse_token_allow_expired(access_token)?;
        let refresh: RefreshClaims = self.codec.parse_token(refresh_token)?;

        self.cache.delete(&access.access_uuid).await?;
        self.cache.delete(&refresh.refresh_uuid).await?;

        Ok(())
    }

    /// Validates the refresh token on signature and expiry alone, re-fetches
    /// the account (a refresh token must not survive account deletion) and
    /// issues a brand-new pair. The old refresh uuid stays live until its
    /// own expiry; see DESIGN.md.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<(TokenPair, Account)> {
        let claims: RefreshClaims = self.codec.parse_token(refresh_token)?;

        let account = self
            .accounts
            .get_account(AccountFilter::Id(claims.account_id))
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let pair = self.issue_session(&account).await?;
        Ok((pair, account))
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account> {
        self.accounts
            .get_account(AccountFilter::Id(account_id.to_string()))
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Mints a pair with fresh correlation ids and registers both in the
    /// cache keyed by uuid, expiring at the claim expiry. All registrations
    /// must succeed: a partially registered pair would fail the liveness
    /// check on its very first use.
    async fn issue_session(&self, account: &Account) -> Result<TokenPair> {
        let access = AccessClaims::new(
            &account.account_id,
            &account.email,
            self.config.access_token_max_age,
        );
        let refresh = RefreshClaims::new(&account.account_id, self.config.refresh_token_max_age);

        let (access_token, refresh_token) = self.codec.create_token_pair(&access, &refresh)?;

        self.cache
            .set(&access.access_uuid, &access_token, access.exp)
            .await?;
        self.cache
            .set(&refresh.refresh_uuid, &refresh_token, refresh.exp)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_uuid: access.access_uuid,
            refresh_uuid: refresh.refresh_uuid,
            access_exp: access.exp,
            refresh_exp: refresh.exp,
        })
    }
}
