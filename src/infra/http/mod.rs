//! HTTP surface: router, middleware and handlers.

mod auth;
mod forms;
mod media;
mod middleware;
mod posts;
mod session;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Request, StatusCode, header::LOCATION},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{
    application::{
        auth::AuthService,
        chrome::build_chrome,
        error::ErrorReport,
        feed::FeedService,
        follows::FollowService,
        posts::PostService,
        repos::{HealthRepo, RepoError},
    },
    cache::{CacheState, page_cache_layer},
    infra::uploads::UploadStorage,
    presentation::views::render_not_found_response,
};

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use session::{CurrentUser, MaybeUser, SessionCookie};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub auth: Arc<AuthService>,
    pub health: Arc<dyn HealthRepo>,
    pub upload_storage: Arc<UploadStorage>,
    pub session_cookie: SessionCookie,
    pub max_request_bytes: usize,
    pub cache: Option<CacheState>,
}

pub fn build_router(state: HttpState) -> Router {
    let index = Router::new().route("/", get(posts::index));
    let index = match state.cache.clone() {
        Some(cache) => index.layer(from_fn_with_state(cache, page_cache_layer)),
        None => index,
    };

    let routes = Router::new()
        .route("/group/{slug}/", get(posts::group_list))
        .route("/profile/{username}/", get(posts::profile))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route(
            "/create/",
            get(posts::create_form).post(posts::create_submit),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_form).post(posts::edit_submit),
        )
        .route(
            "/posts/{post_id}/comment/",
            get(posts::comment_redirect).post(posts::add_comment),
        )
        .route("/follow/", get(posts::follow_index))
        .route(
            "/profile/{username}/follow/",
            get(posts::profile_follow).post(posts::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(posts::profile_unfollow).post(posts::profile_unfollow),
        )
        .route("/auth/signup/", get(auth::signup_form).post(auth::signup_submit))
        .route("/auth/login/", get(auth::login_form).post(auth::login_submit))
        .route("/auth/logout/", get(auth::logout).post(auth::logout))
        .route("/media/{*path}", get(media::serve_media))
        .route("/_health/db", get(db_health))
        .fallback(fallback);

    index
        .merge(routes)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(state.max_request_bytes))
        .layer(from_fn_with_state(state, session::resolve_viewer))
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}

/// `302 Found` redirect to `location`.
pub(crate) fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(_) => {
            response.headers_mut().insert(LOCATION, HeaderValue::from_static("/"));
        }
    }
    response
}

async fn fallback(MaybeUser(viewer): MaybeUser, request: Request<Body>) -> Response {
    render_not_found_response(build_chrome(viewer.as_ref(), request.uri().path()))
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => axum::Json(json!({ "status": "ok" })).into_response(),
        Err(err) => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({ "status": "unavailable" })),
            )
                .into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
