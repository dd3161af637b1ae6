//! Sign up, log in and log out.

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use url::Url;

use crate::application::{
    auth::{AuthError, SignupFormErrors, SignupInput},
    chrome::build_chrome,
    error::HttpError,
};
use crate::domain::entities::UserRecord;
use crate::presentation::views::{
    LayoutContext, LoginFormView, LoginTemplate, SignupFormView, SignupTemplate,
    render_template_response,
};

use super::forms::{LoginForm, NextQuery, SignupForm};
use super::{HttpState, MaybeUser, found};

const INVALID_LOGIN_MESSAGE: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub(super) async fn signup_form(MaybeUser(viewer): MaybeUser) -> Response {
    render_signup(viewer.as_ref(), SignupFormView::default())
}

pub(super) async fn signup_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, HttpError> {
    let refill = SignupFormView {
        username: form.username.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        errors: SignupFormErrors::default(),
    };

    let input = SignupInput {
        username: form.username,
        first_name: form.first_name,
        last_name: form.last_name,
        password1: form.password1,
        password2: form.password2,
    };

    match state.auth.signup(input).await {
        Ok(session) => {
            let jar = state
                .session_cookie
                .issue(jar, &session, state.auth.session_ttl());
            Ok((jar, found("/")).into_response())
        }
        Err(AuthError::InvalidSignup(errors)) => Ok(render_signup(
            None,
            SignupFormView { errors, ..refill },
        )),
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn login_form(
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Response {
    let form = LoginFormView {
        next: query
            .next
            .as_deref()
            .and_then(local_redirect_target)
            .unwrap_or_default(),
        ..LoginFormView::default()
    };
    render_login(viewer.as_ref(), form)
}

pub(super) async fn login_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, HttpError> {
    let next = local_redirect_target(&form.next);

    match state.auth.login(&form.username, &form.password).await {
        Ok(session) => {
            let jar = state
                .session_cookie
                .issue(jar, &session, state.auth.session_ttl());
            let target = next.unwrap_or_else(|| "/".to_string());
            Ok((jar, found(&target)).into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok(render_login(
            None,
            LoginFormView {
                username: form.username,
                next: next.unwrap_or_default(),
                error: Some(INVALID_LOGIN_MESSAGE.to_string()),
            },
        )),
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(token) = state.session_cookie.token(&jar) {
        if let Err(err) = state.auth.logout(token).await {
            warn!(
                target = "yatube::http::auth",
                error = %err,
                "failed to delete session"
            );
        }
    }
    let jar = state.session_cookie.clear(jar);
    (jar, found("/")).into_response()
}

fn render_signup(viewer: Option<&UserRecord>, form: SignupFormView) -> Response {
    let chrome = build_chrome(viewer, "/auth/signup/").with_title("Sign up");
    render_template_response(
        SignupTemplate {
            view: LayoutContext::new(chrome, form),
        },
        StatusCode::OK,
    )
}

fn render_login(viewer: Option<&UserRecord>, form: LoginFormView) -> Response {
    let chrome = build_chrome(viewer, "/auth/login/").with_title("Log in");
    render_template_response(
        LoginTemplate {
            view: LayoutContext::new(chrome, form),
        },
        StatusCode::OK,
    )
}

/// Accept `next` only when it resolves to a path on this site.
fn local_redirect_target(next: &str) -> Option<String> {
    if !next.starts_with('/') {
        return None;
    }
    let base = Url::parse("http://yatube.invalid/").ok()?;
    let target = base.join(next).ok()?;
    if target.origin() != base.origin() {
        return None;
    }

    let mut local = target.path().to_string();
    if let Some(query) = target.query() {
        local.push('?');
        local.push_str(query);
    }
    Some(local)
}
