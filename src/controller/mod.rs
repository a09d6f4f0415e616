pub mod handler;
pub mod image;
pub mod post;
pub mod profile;
