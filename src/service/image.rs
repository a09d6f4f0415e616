use crate::config::config::Config;
use crate::models::image::Image;
use crate::models::response::AuthResponse;
use crate::repository::database::{ImageStore, StoreError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use log::error;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

type Result<T> = std::result::Result<T, ImageError>;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image is required")]
    Missing,
    #[error("Image type {0} is not allowed")]
    NotAllowed(String),
    #[error("{0}")]
    Upload(String),
    #[error("An error occurred")]
    Io(#[source] std::io::Error),
    #[error("An error occurred")]
    Store(#[source] StoreError),
}

impl ImageError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ImageError::Missing => "image_required",
            ImageError::NotAllowed(_) => "image_not_allowed",
            ImageError::Upload(_) => "invalid_input",
            ImageError::Io(_) | ImageError::Store(_) => "internal_server_error",
        }
    }
}

impl From<StoreError> for ImageError {
    fn from(err: StoreError) -> Self {
        ImageError::Store(err)
    }
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Io(err)
    }
}

impl ResponseError for ImageError {
    fn status_code(&self) -> StatusCode {
        match self {
            ImageError::Missing | ImageError::NotAllowed(_) | ImageError::Upload(_) => {
                StatusCode::BAD_REQUEST
            }
            ImageError::Io(_) | ImageError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

/// Persists uploaded image files under the configured upload directory and
/// records each file in the image store. The returned URL is what posts
/// reference.
#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ImageStore>,
    upload_dir: String,
}

impl ImageService {
    pub fn new(images: Arc<dyn ImageStore>, config: &Config) -> Self {
        ImageService {
            images,
            upload_dir: config.upload_dir.to_owned(),
        }
    }

    /// The stored filename is derived from the uploader's email and a
    /// timestamp, never from the client-supplied name; only the extension of
    /// the original name survives.
    pub async fn save_image(&self, email: &str, original_name: &str, bytes: &[u8]) -> Result<String> {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let base = sanitize_basename(&format!("{}_{}", email, timestamp));
        let filename = match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", base, ext.to_lowercase()),
            None => base,
        };

        fs::create_dir_all(&self.upload_dir).await?;
        let path = Path::new(&self.upload_dir).join(&filename);
        fs::write(&path, bytes).await?;

        let image = Image {
            image_id: Uuid::new_v4().to_string(),
            image_url: format!("/{}/{}", self.upload_dir.trim_matches('/'), filename),
        };
        self.images.insert_image(&image).await?;

        Ok(image.image_url)
    }
}

/// Lowercases and keeps only characters safe in a filename; everything else
/// collapses to a dash.
fn sanitize_basename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
