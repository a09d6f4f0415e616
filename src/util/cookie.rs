use actix_web::cookie::{time::Duration as ActixWebDuration, Cookie};
use chrono::Utc;

/// Builds an http-only cookie that lives until the given Unix timestamp.
pub fn http_only_cookie(name: &'static str, value: &str, expire_at_unix: i64) -> Cookie<'static> {
    let max_age = (expire_at_unix - Utc::now().timestamp()).max(0);
    Cookie::build(name, value.to_owned())
        .path("/")
        .max_age(ActixWebDuration::new(max_age, 0))
        .http_only(true)
        .finish()
}

pub fn remove_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .max_age(ActixWebDuration::new(-1, 0))
        .http_only(true)
        .finish()
}
