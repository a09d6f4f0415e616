pub mod auth;
pub mod image;
pub mod post;
pub mod profile;
