pub mod cookie;
pub mod password;
pub mod send_email;
pub mod token;
