pub mod account;
pub mod image;
pub mod post;
pub mod response;
pub mod schema;
pub mod token_claims;
