//! Session cookie handling and the extractors built on it.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;
use url::form_urlencoded;

use crate::application::auth::{SessionIssued, Viewer};
use crate::domain::entities::UserRecord;

use super::{HttpState, found};

pub const LOGIN_PATH: &str = "/auth/login/";

/// Name and flags of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
}

impl SessionCookie {
    pub fn issue(&self, jar: CookieJar, session: &SessionIssued, ttl: Duration) -> CookieJar {
        let max_age = time::Duration::try_from(ttl).unwrap_or(time::Duration::WEEK);
        let cookie = Cookie::build((self.name.clone(), session.token.clone()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age);
        jar.add(cookie)
    }

    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(self.name.clone()).path("/"))
    }

    pub fn token<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    }
}

/// Resolve the session cookie to a [`Viewer`] and store it in the request
/// extensions. Unknown or expired tokens leave the request anonymous.
pub async fn resolve_viewer(
    State(state): State<HttpState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = match state.session_cookie.token(&jar) {
        Some(token) => match state.auth.resolve_session(token).await {
            Ok(user) => user,
            Err(err) => {
                warn!(
                    target = "yatube::http::session",
                    error = %err,
                    "failed to resolve session; continuing anonymously"
                );
                None
            }
        },
        None => None,
    };

    let viewer = Viewer(user);
    request.extensions_mut().insert(viewer.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(viewer);
    response
}

/// The logged-in user. Guests are redirected to the login page with a `next`
/// parameter pointing back at the requested path.
pub struct CurrentUser(pub UserRecord);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Viewer>().and_then(Viewer::user) {
            Some(user) => Ok(Self(user.clone())),
            None => Err(login_redirect(parts.uri.path())),
        }
    }
}

/// The logged-in user, if any.
pub struct MaybeUser(pub Option<UserRecord>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Viewer>()
                .and_then(|viewer| viewer.0.clone()),
        ))
    }
}

pub fn login_redirect(next: &str) -> Response {
    // Slashes stay readable in the query: `/auth/login/?next=/create/`.
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes())
        .collect::<String>()
        .replace("%2F", "/");
    found(&format!("{LOGIN_PATH}?next={encoded}"))
}
