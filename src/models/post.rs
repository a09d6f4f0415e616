use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A blog post. `date` is the publication timestamp and doubles as the
/// paging cursor for listings.
#[derive(Serialize, Deserialize, Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::models::schema::posts)]
pub struct Post {
    pub post_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub date: chrono::NaiveDateTime,
    #[serde(rename = "lastUpdated")]
    pub last_updated: chrono::NaiveDateTime,
    #[serde(skip_serializing)]
    pub account_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostSchema {
    #[validate(length(min = 1))]
    pub content: String,
    pub image_url: Option<String>,
}

/// Listing parameters. `before` pages backwards through time: only posts
/// strictly older than the cursor are returned.
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub limit: Option<i64>,
    pub before: Option<chrono::NaiveDateTime>,
}
