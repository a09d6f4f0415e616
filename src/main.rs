use crate::config::config::Config;
use crate::config::jwt_auth::RequireAuth;
use crate::repository::database::Database;
use crate::repository::redis::{CacheStore, Redis};
use crate::service::auth::AuthService;
use crate::service::image::ImageService;
use crate::service::post::PostService;
use crate::service::profile::ProfileService;
use crate::util::send_email::SmtpMailer;
use crate::util::token::TokenCodec;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder, Result};
use serde::Serialize;
use std::sync::Arc;

mod config;
mod controller;
mod models;
mod repository;
mod service;
#[cfg(test)]
mod testutil;
mod util;

#[derive(Serialize)]
pub struct Response {
    status: String,
    message: String,
}

#[get("/health")]
async fn health_check() -> impl Responder {
    let response = Response {
        status: "Success".to_string(),
        message: "Everything is working as expected".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn not_found() -> Result<HttpResponse> {
    let response = Response {
        status: "Failed".to_string(),
        message: "Resource not found".to_string(),
    };
    Ok(HttpResponse::NotFound().json(response))
}

pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
    pub profile: ProfileService,
    pub images: ImageService,
    pub codec: TokenCodec,
    pub cache: Arc<dyn CacheStore>,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    log4rs::init_file("./log-config.yml", Default::default()).expect("Log config file not found.");
    let config = Config::init();

    let database = Arc::new(Database::new(&config));
    let cache: Arc<dyn CacheStore> = Arc::new(Redis::new(&config));
    let mailer = Arc::new(SmtpMailer::new(&config));
    let codec = TokenCodec::new(&config.jwt_secret);

    let auth = AuthService::new(
        database.clone(),
        database.clone(),
        cache.clone(),
        mailer,
        codec.clone(),
        config.clone(),
    );
    let posts = PostService::new(database.clone());
    let profile = ProfileService::new(database.clone(), database.clone());
    let images = ImageService::new(database, &config);

    let app_data = web::Data::new(AppState {
        auth,
        posts,
        profile,
        images,
        codec,
        cache,
        config,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(controller::handler::config)
            .service(health_check)
            .default_service(web::route().to(not_found))
            .wrap(RequireAuth)
            .wrap(actix_web::middleware::Logger::default())
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
