use crate::models::token_claims::{AccessClaims, TokenPair};
use crate::service::auth::AuthError;
use crate::util::cookie::http_only_cookie;
use crate::util::token::TokenError;
use crate::AppState;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{
    web, Error as ActixWebError, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

/// Routes that are reachable without a token. Everything else goes through
/// the gate.
pub const EXCLUDED_FROM_AUTH: &[&str] = &[
    "/health",
    "/api/auth/login",
    "/api/auth/signup",
    "/api/auth/verify_email",
    "/api/auth/reset_password",
    "/api/auth/change_password",
    "/api/auth/refresh_token",
    "/api/auth/signout",
];

/// Identity resolved by the gate, available to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: String,
    pub email: String,
}

impl FromRequest for AuthenticatedAccount {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedAccount>()
                .cloned()
                .ok_or_else(|| AuthError::MissingToken.into()),
        )
    }
}

/// Request gate. Validates the presented access token against signature,
/// expiry and the cache liveness entry, and transparently re-issues a pair
/// from the refresh cookie when the access token has expired or been
/// evicted. The fresh pair is written to response cookies.
pub struct RequireAuth;

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixWebError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixWebError;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixWebError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixWebError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if EXCLUDED_FROM_AUTH.contains(&req.path()) {
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let data = match req.app_data::<web::Data<AppState>>().cloned() {
                Some(data) => data,
                None => {
                    let (request, _) = req.into_parts();
                    let response = HttpResponse::InternalServerError()
                        .finish()
                        .map_into_right_body();
                    return Ok(ServiceResponse::new(request, response));
                }
            };

            let (account, fresh_pair) = match authenticate(&req, &data).await {
                Ok(resolved) => resolved,
                Err(err) => {
                    let (request, _) = req.into_parts();
                    let response = err.error_response().map_into_right_body();
                    return Ok(ServiceResponse::new(request, response));
                }
            };
            req.extensions_mut().insert(account);

            let mut res = service.call(req).await?;

            if let Some(pair) = fresh_pair {
                res.response_mut()
                    .add_cookie(&http_only_cookie(
                        "access_token",
                        &pair.access_token,
                        pair.access_exp,
                    ))
                    .map_err(ErrorInternalServerError)?;
                res.response_mut()
                    .add_cookie(&http_only_cookie(
                        "refresh_token",
                        &pair.refresh_token,
                        pair.refresh_exp,
                    ))
                    .map_err(ErrorInternalServerError)?;
            }

            Ok(res.map_into_left_body())
        })
    }
}

async fn authenticate(
    req: &ServiceRequest,
    data: &web::Data<AppState>,
) -> Result<(AuthenticatedAccount, Option<TokenPair>), AuthError> {
    // header first, then the cookie the gate itself writes on a transparent
    // refresh, so browser clients stay authenticated without replaying the
    // Authorization header
    let access_token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).to_string())
        .or_else(|| req.cookie("access_token").map(|c| c.value().to_string()))
        .ok_or(AuthError::MissingToken)?;

    match data.codec.parse_token::<AccessClaims>(&access_token) {
        Ok(claims) => match data.cache.get(&claims.access_uuid).await? {
            Some(stored) if stored == access_token => Ok((
                AuthenticatedAccount {
                    account_id: claims.account_id,
                    email: claims.email,
                },
                None,
            )),
            // a well-signed token whose uuid maps to a different string is a
            // replay or stale-cache anomaly
            Some(_) => Err(AuthError::Unauthorized),
            // logged out or evicted: treated exactly like an expired token
            None => refresh_session(req, data).await,
        },
        Err(TokenError::Expired) => refresh_session(req, data).await,
        Err(err) => Err(err.into()),
    }
}

async fn refresh_session(
    req: &ServiceRequest,
    data: &web::Data<AppState>,
) -> Result<(AuthenticatedAccount, Option<TokenPair>), AuthError> {
    let cookie = req.cookie("refresh_token").ok_or(AuthError::MissingToken)?;

    let (pair, account) = data.auth.refresh_token(cookie.value()).await?;

    Ok((
        AuthenticatedAccount {
            account_id: account.account_id,
            email: account.email,
        },
        Some(pair),
    ))
}
