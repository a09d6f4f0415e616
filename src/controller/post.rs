use crate::config::jwt_auth::AuthenticatedAccount;
use crate::models::post::{CreatePostSchema, PostListQuery};
use crate::models::response::PostListResponse;
use crate::service::post::PostError;
use crate::AppState;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, HttpResponse};
use validator::Validate;

type Result<T> = std::result::Result<T, PostError>;

#[post("/post")]
pub(crate) async fn create_post_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
    body: Json<CreatePostSchema>,
) -> Result<HttpResponse> {
    body.validate()
        .map_err(|e| PostError::InvalidInput(e.to_string()))?;

    let post = data
        .posts
        .create_post(&auth.account_id, &body.content, body.image_url.clone())
        .await?;

    Ok(HttpResponse::Created().json(post))
}

#[get("/post")]
pub(crate) async fn list_posts_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
    query: Query<PostListQuery>,
) -> Result<HttpResponse> {
    let posts = data
        .posts
        .list_posts(&auth.account_id, query.limit, query.before)
        .await?;

    Ok(HttpResponse::Ok().json(PostListResponse { post_list: posts }))
}

#[delete("/post/{post_id}")]
pub(crate) async fn delete_post_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
    path: Path<String>,
) -> Result<HttpResponse> {
    data.posts.delete_post(&path, &auth.account_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
