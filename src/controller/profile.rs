use crate::config::jwt_auth::AuthenticatedAccount;
use crate::models::account::UpdateProfileSchema;
use crate::models::response::ProfileResponse;
use crate::service::profile::ProfileError;
use crate::AppState;
use actix_web::web::{Data, Json};
use actix_web::{get, put, HttpResponse};
use validator::Validate;

type Result<T> = std::result::Result<T, ProfileError>;

#[get("/profile")]
pub(crate) async fn get_profile_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse> {
    let (profile, account) = data.profile.get_profile(&auth.account_id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        full_name: profile.full_name,
        email: account.email,
    }))
}

#[put("/profile")]
pub(crate) async fn update_profile_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
    body: Json<UpdateProfileSchema>,
) -> Result<HttpResponse> {
    body.validate()
        .map_err(|e| ProfileError::InvalidInput(e.to_string()))?;

    data.profile
        .update_full_name(&auth.account_id, &body.full_name)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
