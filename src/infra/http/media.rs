use std::io::ErrorKind;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::error;

use crate::application::error::HttpError;
use crate::infra::uploads::UploadStorageError;

use super::HttpState;

const SOURCE: &str = "infra::http::media::serve_media";

pub(super) async fn serve_media(
    State(state): State<HttpState>,
    Path(path): Path<String>,
) -> Response {
    match state.upload_storage.read(&path).await {
        Ok(bytes) => build_media_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => {
            HttpError::not_found(SOURCE, "media path rejected").into_response()
        }
        Err(UploadStorageError::Io(err))
            if matches!(
                err.kind(),
                ErrorKind::NotFound | ErrorKind::IsADirectory | ErrorKind::NotADirectory
            ) =>
        {
            HttpError::not_found(SOURCE, format!("media file `{path}` does not exist"))
                .into_response()
        }
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored media"
            );
            HttpError::internal(SOURCE, &err).into_response()
        }
    }
}

fn build_media_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    // Stored names carry a random suffix and are never rewritten.
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
