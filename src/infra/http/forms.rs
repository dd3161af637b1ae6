//! Form payloads shared by the post handlers.

use axum::{
    Form,
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::Field;
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::application::error::HttpError;
use crate::application::posts::{ImageUpload, PostInput};

const SOURCE: &str = "infra::http::forms";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPostForm {
    text: String,
    group: String,
}

/// The post form, read from either `application/x-www-form-urlencoded` or
/// `multipart/form-data`. Only the multipart variant can carry an image.
pub struct PostForm(pub PostInput);

impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(raw) = Form::<RawPostForm>::from_request(request, state)
                .await
                .map_err(|err| {
                    HttpError::from_error(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Invalid form submission",
                        &err,
                    )
                })?;
            return Ok(Self(PostInput {
                text: raw.text,
                group: raw.group,
                image: None,
            }));
        }

        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|err| {
                HttpError::from_error(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    "Invalid form submission",
                    &err,
                )
            })?;

        let mut input = PostInput::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(err) => {
                    let status = err.status();
                    warn!(
                        target = SOURCE,
                        status = status.as_u16(),
                        error = %err,
                        "failed to read multipart payload"
                    );
                    let public_message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                        "Upload is too large"
                    } else {
                        "Invalid form submission"
                    };
                    return Err(HttpError::from_error(SOURCE, status, public_message, &err));
                }
            };

            match field.name() {
                Some("text") => input.text = read_text(field).await?,
                Some("group") => input.group = read_text(field).await?,
                Some("image") => {
                    let filename = field
                        .file_name()
                        .map(|value| value.to_string())
                        .unwrap_or_default();
                    let data: Bytes = field.bytes().await.map_err(|err| {
                        HttpError::from_error(SOURCE, err.status(), "Invalid form submission", &err)
                    })?;
                    // Browsers send an empty part when no file was chosen.
                    if !data.is_empty() {
                        input.image = Some(ImageUpload { filename, data });
                    }
                }
                _ => {}
            }
        }

        Ok(Self(input))
    }
}

async fn read_text(field: Field) -> Result<String, HttpError> {
    field.text().await.map_err(|err| {
        HttpError::from_error(SOURCE, err.status(), "Invalid form submission", &err)
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}
