use crate::models::post::Post;
use crate::models::response::AuthResponse;
use crate::repository::database::{PostStore, StoreError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{NaiveDateTime, Utc};
use log::error;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

type Result<T> = std::result::Result<T, PostError>;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Post not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("An error occurred")]
    Store(#[source] StoreError),
}

impl PostError {
    pub fn error_type(&self) -> &'static str {
        match self {
            PostError::NotFound => "not_found",
            PostError::InvalidInput(_) => "invalid_input",
            PostError::Store(_) => "internal_server_error",
        }
    }
}

impl From<StoreError> for PostError {
    fn from(err: StoreError) -> Self {
        PostError::Store(err)
    }
}

impl ResponseError for PostError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostError::NotFound => StatusCode::NOT_FOUND,
            PostError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PostError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

/// Post lifecycle for a single account: create, page through, delete.
/// Ownership is enforced at the store, never trusted from the request.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        PostService { posts }
    }

    pub async fn create_post(
        &self,
        account_id: &str,
        content: &str,
        image_url: Option<String>,
    ) -> Result<Post> {
        let now = Utc::now().naive_utc();
        let post = Post {
            post_id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            image_url,
            date: now,
            last_updated: now,
            account_id: account_id.to_string(),
        };

        Ok(self.posts.insert_post(post).await?)
    }

    /// Newest first. `before` excludes everything at or after the cursor, so
    /// passing the date of the last post seen pages backwards without
    /// duplicates.
    pub async fn list_posts(
        &self,
        account_id: &str,
        limit: Option<i64>,
        before: Option<NaiveDateTime>,
    ) -> Result<Vec<Post>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Ok(self.posts.list_posts(account_id, limit, before).await?)
    }

    /// Deleting a post that does not exist, or that belongs to a different
    /// account, both surface as `NotFound`.
    pub async fn delete_post(&self, post_id: &str, account_id: &str) -> Result<()> {
        let deleted = self.posts.delete_post(post_id, account_id).await?;
        if deleted == 0 {
            return Err(PostError::NotFound);
        }
        Ok(())
    }
}
