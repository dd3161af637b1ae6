use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        auth::AuthError, feed::FeedError, follows::FollowError, groups::GroupError,
        posts::PostServiceError, repos::RepoError,
    },
    infra::error::InfraError,
    presentation::views,
};

const SOURCE: &str = "application::error";

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An error that ends a request. Rendered as the HTML error page for its
/// status; the details travel in an [`ErrorReport`] for the response logger.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, "Page not found", detail)
    }

    pub fn internal(source: &'static str, error: &dyn StdError) -> Self {
        Self::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            error,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = views::render_error_page(self.status, self.public_message);
        self.report.attach(&mut response);
        response
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => HttpError::not_found(SOURCE, "record not found"),
            RepoError::Timeout => HttpError::from_error(
                SOURCE,
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
                &error,
            ),
            other => HttpError::internal(SOURCE, &other),
        }
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::Repo(err) => err.into(),
        }
    }
}

impl From<PostServiceError> for HttpError {
    fn from(error: PostServiceError) -> Self {
        match error {
            PostServiceError::PostNotFound(id) => {
                HttpError::not_found(SOURCE, format!("post {id} does not exist"))
            }
            PostServiceError::Repo(err) => err.into(),
            other => HttpError::internal(SOURCE, &other),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        match error {
            FollowError::UnknownAuthor(username) => {
                HttpError::not_found(SOURCE, format!("user `{username}` does not exist"))
            }
            FollowError::Repo(err) => err.into(),
        }
    }
}

impl From<AuthError> for HttpError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Repo(err) => err.into(),
            other => HttpError::internal(SOURCE, &other),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
