use diesel::{AsChangeset, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = crate::models::schema::accounts)]
pub struct Account {
    pub account_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub salt: Vec<u8>,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub email_token: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<chrono::NaiveDateTime>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<chrono::NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::models::schema::profiles)]
pub struct Profile {
    pub profile_id: String,
    pub account_id: String,
    pub full_name: String,
}

/// Lookup key for the credential store.
#[derive(Debug, Clone)]
pub enum AccountFilter {
    Id(String),
    Email(String),
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpSchema {
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10))]
    pub password: String,
    #[validate(must_match = "password")]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginSchema {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileSchema {
    #[validate(length(min = 1))]
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordSchema {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordSchema {
    #[validate(length(min = 10))]
    pub password: String,
    #[validate(must_match = "password")]
    pub password_confirmation: String,
}
