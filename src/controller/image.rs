use crate::config::jwt_auth::AuthenticatedAccount;
use crate::models::response::ImageUploadResponse;
use crate::service::image::ImageError;
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::web::Data;
use actix_web::{post, HttpResponse};
use futures::TryStreamExt;

const ALLOWED_IMAGE_MIME: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

type Result<T> = std::result::Result<T, ImageError>;

/// Multipart upload with a single `image` field. The MIME type is checked
/// against an allow-list before anything is written to disk.
#[post("/image")]
pub(crate) async fn upload_image_handler(
    data: Data<AppState>,
    auth: AuthenticatedAccount,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ImageError::Upload(e.to_string()))?
    {
        if field.name() != "image" {
            continue;
        }

        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        if !ALLOWED_IMAGE_MIME.contains(&mime.as_str()) {
            return Err(ImageError::NotAllowed(mime));
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("image")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ImageError::Upload(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
        }

        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or(ImageError::Missing)?;
    let image_url = data.images.save_image(&auth.email, &filename, &bytes).await?;

    Ok(HttpResponse::Ok().json(ImageUploadResponse { image_url }))
}

#[cfg(test)]
mod tests {
    use crate::config::jwt_auth::RequireAuth;
    use crate::controller::handler;
    use crate::testutil::{test_harness, TestHarness};
    use crate::AppState;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::Value;

    fn app_state(harness: &TestHarness) -> AppState {
        AppState {
            auth: harness.auth.clone(),
            posts: harness.posts.clone(),
            profile: harness.profile.clone(),
            images: harness.images.clone(),
            codec: harness.codec.clone(),
            cache: harness.cache.clone(),
            config: harness.config.clone(),
        }
    }

    macro_rules! gated_api_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .wrap(RequireAuth)
                    .configure(handler::config),
            )
            .await
        };
    }

    async fn bearer(harness: &TestHarness) -> String {
        let (account, _) = harness
            .auth
            .sign_up("a@x.com", "longpassword1", "Test Person")
            .await
            .unwrap();
        harness
            .auth
            .verify_email(account.email_token.as_deref().unwrap())
            .await
            .unwrap();
        let pair = harness.auth.login("a@x.com", "longpassword1").await.unwrap();
        format!("Bearer {}", pair.access_token)
    }

    const BOUNDARY: &str = "------------------------abcdef123456";

    fn multipart_image(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                 name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn content_type_header() -> (&'static str, String) {
        ("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
    }

    #[actix_web::test]
    async fn upload_answers_with_the_image_url() {
        let harness = test_harness();
        let token = bearer(&harness).await;
        let app = gated_api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/image")
                .insert_header((AUTHORIZATION, token))
                .insert_header(content_type_header())
                .set_payload(multipart_image("image", "pic.png", "image/png", b"png bytes"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = test::read_body_json(res).await;
        let url = body["image_url"].as_str().unwrap();
        assert!(url.ends_with(".png"));
        assert_eq!(harness.image_store.len(), 1);
    }

    #[actix_web::test]
    async fn disallowed_mime_type_is_rejected() {
        let harness = test_harness();
        let token = bearer(&harness).await;
        let app = gated_api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/image")
                .insert_header((AUTHORIZATION, token))
                .insert_header(content_type_header())
                .set_payload(multipart_image("image", "evil.html", "text/html", b"<html>"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error_type"], "image_not_allowed");
        assert_eq!(harness.image_store.len(), 0);
    }

    #[actix_web::test]
    async fn missing_image_field_is_rejected() {
        let harness = test_harness();
        let token = bearer(&harness).await;
        let app = gated_api_app!(app_state(&harness));

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/image")
                .insert_header((AUTHORIZATION, token))
                .insert_header(content_type_header())
                .set_payload(multipart_image("other", "pic.png", "image/png", b"png bytes"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error_type"], "image_required");
    }
}
