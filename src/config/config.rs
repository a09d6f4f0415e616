use dotenv::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub access_token_max_age: i64,
    pub refresh_token_max_age: i64,
    pub email_token_max_age: i64,
    pub reset_token_max_age: i64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
    pub email_verification_subject: String,
    pub reset_password_subject: String,
    pub upload_dir: String,
}

impl Config {
    pub fn init() -> Config {
        dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let host = std::env::var("HOST").expect("HOST must be set");

        let smtp_host = std::env::var("SMTP_HOST").expect("SMTP_HOST must be set");
        let smtp_port = std::env::var("SMTP_PORT")
            .expect("SMTP_PORT must be set")
            .parse::<u16>()
            .expect("Failed to parse SMTP_PORT as u16");
        let smtp_username = std::env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set");
        let smtp_password = std::env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set");
        let smtp_from = std::env::var("SMTP_FROM").expect("SMTP_FROM must be set");

        Config {
            database_url,
            redis_url,
            jwt_secret,
            host,
            access_token_max_age: env_var_or("ACCESS_TOKEN_MAX_AGE_MINUTES", 15),
            refresh_token_max_age: env_var_or("REFRESH_TOKEN_MAX_AGE_MINUTES", 60),
            email_token_max_age: env_var_or("EMAIL_TOKEN_MAX_AGE_MINUTES", 15),
            reset_token_max_age: env_var_or("RESET_TOKEN_MAX_AGE_MINUTES", 24 * 60),
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            smtp_from,
            email_verification_subject: std::env::var("EMAIL_VERIFICATION_SUBJECT")
                .unwrap_or_else(|_| "Verify your email".to_string()),
            reset_password_subject: std::env::var("RESET_PASSWORD_SUBJECT")
                .unwrap_or_else(|_| "Reset your password".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "upload/images".to_string()),
        }
    }
}

fn env_var_or(name: &str, default: i64) -> i64 {
    let value = std::env::var(name).unwrap_or_else(|_| String::new());

    if value.is_empty() {
        default
    } else {
        value
            .parse::<i64>()
            .unwrap_or_else(|_| panic!("Failed to parse {} as i64", name))
    }
}
