use crate::config::jwt_auth::AuthenticatedAccount;
use crate::models::account::{
    ChangePasswordSchema, LoginSchema, ResetPasswordSchema, SignUpSchema,
};
use crate::models::response::{
    FilteredAccount, LoginResponse, MessageResponse, RefreshTokenResponse, SignUpResponse,
};
use crate::service::auth::AuthError;
use crate::util::cookie::{http_only_cookie, remove_cookie};
use crate::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::{Data, Json, Query};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::warn;
use serde::Deserialize;
use validator::Validate;

type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: String,
}

#[post("/auth/signup")]
async fn sign_up_handler(
    data: Data<AppState>,
    body: Json<SignUpSchema>,
) -> Result<HttpResponse> {
    body.validate()
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

    let (account, profile) = data
        .auth
        .sign_up(&body.email, &body.password, &body.full_name)
        .await?;

    Ok(HttpResponse::Created().json(SignUpResponse {
        message: "Account created, please verify your email".to_string(),
        account: FilteredAccount::from_account(&account),
        profile,
    }))
}

#[post("/auth/login")]
async fn login_handler(data: Data<AppState>, body: Json<LoginSchema>) -> Result<HttpResponse> {
    let pair = data.auth.login(&body.email, &body.password).await?;

    let cookie = http_only_cookie("refresh_token", &pair.refresh_token, pair.refresh_exp);
    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        access_token: pair.access_token,
    }))
}

#[post("/auth/refresh_token")]
async fn refresh_token_handler(req: HttpRequest, data: Data<AppState>) -> Result<HttpResponse> {
    let cookie = req.cookie("refresh_token").ok_or(AuthError::MissingToken)?;

    let (pair, _) = data.auth.refresh_token(cookie.value()).await?;

    let cookie = http_only_cookie("refresh_token", &pair.refresh_token, pair.refresh_exp);
    Ok(HttpResponse::Ok().cookie(cookie).json(RefreshTokenResponse {
        access_token: pair.access_token,
    }))
}

#[get("/auth/verify_email")]
async fn verify_email_handler(
    data: Data<AppState>,
    query: Query<TokenQuery>,
) -> Result<HttpResponse> {
    data.auth.verify_email(&query.token).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Email verified".to_string(),
    }))
}

#[post("/auth/reset_password")]
async fn reset_password_handler(
    data: Data<AppState>,
    body: Json<ResetPasswordSchema>,
) -> Result<HttpResponse> {
    body.validate()
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

    match data.auth.reset_password(&body.email).await {
        Ok(()) => {}
        // an unknown email still answers 200 so callers cannot probe for
        // registered addresses
        Err(AuthError::NotFound) => {
            warn!("password reset requested for unknown email: {}", body.email);
        }
        Err(err) => return Err(err),
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "If the email is registered, a reset link has been sent".to_string(),
    }))
}

#[post("/auth/change_password")]
async fn change_password_handler(
    data: Data<AppState>,
    query: Query<TokenQuery>,
    body: Json<ChangePasswordSchema>,
) -> Result<HttpResponse> {
    body.validate()
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

    data.auth.change_password(&query.token, &body.password).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

#[post("/auth/signout")]
async fn sign_out_handler(req: HttpRequest, data: Data<AppState>) -> Result<HttpResponse> {
    let access_token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).to_string())
        .or_else(|| req.cookie("access_token").map(|c| c.value().to_string()))
        .ok_or(AuthError::MissingToken)?;

    let refresh_cookie = req.cookie("refresh_token").ok_or(AuthError::MissingToken)?;

    data.auth
        .sign_out(&access_token, refresh_cookie.value())
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(remove_cookie("access_token"))
        .cookie(remove_cookie("refresh_token"))
        .json(MessageResponse {
            message: "Signed out".to_string(),
        }))
}

#[get("/account/me")]
async fn get_account_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse> {
    let account = data.auth.get_account(&auth.account_id).await?;

    Ok(HttpResponse::Ok().json(FilteredAccount::from_account(&account)))
}

pub fn config(conf: &mut web::ServiceConfig) {
    let scope = web::scope("/api")
        .service(sign_up_handler)
        .service(login_handler)
        .service(refresh_token_handler)
        .service(verify_email_handler)
        .service(reset_password_handler)
        .service(change_password_handler)
        .service(sign_out_handler)
        .service(get_account_handler)
        .service(super::post::create_post_handler)
        .service(super::post::list_posts_handler)
        .service(super::post::delete_post_handler)
        .service(super::profile::get_profile_handler)
        .service(super::profile::update_profile_handler)
        .service(super::image::upload_image_handler);

    conf.service(scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_harness, TestHarness};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn app_state(harness: &TestHarness) -> AppState {
        AppState {
            auth: harness.auth.clone(),
            posts: harness.posts.clone(),
            profile: harness.profile.clone(),
            images: harness.images.clone(),
            codec: harness.codec.clone(),
            cache: harness.cache.clone(),
            config: harness.config.clone(),
        }
    }

    macro_rules! api_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new($state))
                    .configure(config),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn reset_password_for_unknown_email_still_answers_ok() {
        let harness = test_harness();
        let app = api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/reset_password")
                .set_json(json!({ "email": "missing@x.com" }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(harness.mailer.sent.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn login_failure_keeps_the_message_generic() {
        let harness = test_harness();
        let app = api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "missing@x.com", "password": "whatever123" }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error_type"], "invalid_credentials");
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[actix_web::test]
    async fn signup_login_round_trip_sets_refresh_cookie() {
        let harness = test_harness();
        let app = api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json(json!({
                    "full_name": "Test Person",
                    "email": "a@x.com",
                    "password": "longpassword1",
                    "confirm_password": "longpassword1",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        // verify through the link that was mailed out
        let token = {
            let sent = harness.mailer.sent.lock().unwrap();
            let body = &sent[0].body;
            let start = body.find("token=").unwrap() + "token=".len();
            let end = body[start..].find('"').unwrap();
            body[start..start + end].to_string()
        };
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/auth/verify_email?token={}", token))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "a@x.com", "password": "longpassword1" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res
            .response()
            .cookies()
            .any(|c| c.name() == "refresh_token" && !c.value().is_empty()));

        let body: Value = test::read_body_json(res).await;
        assert!(!body["access_token"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn signup_with_short_password_is_bad_request() {
        let harness = test_harness();
        let app = api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json(json!({
                    "full_name": "Test Person",
                    "email": "a@x.com",
                    "password": "short",
                    "confirm_password": "short",
                }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn duplicate_signup_is_conflict() {
        let harness = test_harness();
        let app = api_app!(app_state(&harness));

        let payload = json!({
            "full_name": "Test Person",
            "email": "a@x.com",
            "password": "longpassword1",
            "confirm_password": "longpassword1",
        });

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json(payload.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json(payload)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error_type"], "duplicate_email");
    }

    #[actix_web::test]
    async fn sign_out_clears_the_refresh_cookie() {
        let harness = test_harness();
        let (account, _) = harness
            .auth
            .sign_up("a@x.com", "longpassword1", "Test Person")
            .await
            .unwrap();
        harness
            .auth
            .verify_email(account.email_token.as_deref().unwrap())
            .await
            .unwrap();
        let pair = harness.auth.login("a@x.com", "longpassword1").await.unwrap();

        let app = api_app!(app_state(&harness));
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/signout")
                .insert_header((AUTHORIZATION, format!("Bearer {}", pair.access_token)))
                .cookie(actix_web::cookie::Cookie::new(
                    "refresh_token",
                    pair.refresh_token.clone(),
                ))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        for name in ["access_token", "refresh_token"] {
            let cleared = res
                .response()
                .cookies()
                .find(|c| c.name() == name)
                .unwrap();
            assert!(cleared.value().is_empty());
        }
        assert!(!harness.cache.contains(&pair.access_uuid));
        assert!(!harness.cache.contains(&pair.refresh_uuid));
    }
}
