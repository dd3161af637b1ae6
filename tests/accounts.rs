mod support;

use axum::http::{StatusCode, header};

use support::{COOKIE_NAME, PASSWORD, TestApp, body_text, location, page_name};

fn session_cookie(response: &axum::http::Response<axum::body::Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{COOKIE_NAME}=")))
        .map(|value| value.split(';').next().unwrap_or_default().to_string())
}

#[tokio::test]
async fn signup_logs_the_new_user_in() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/auth/signup/",
            None,
            "username=leo&first_name=Leo&last_name=Tolstoy&password1=war-and-peace&password2=war-and-peace",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let cookie = session_cookie(&response).expect("cookie pair");
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Leo Tolstoy"));
    assert!(html.contains("href=\"/create/\""));
}

#[tokio::test]
async fn signup_with_taken_username_is_a_form_error() {
    let app = TestApp::new();
    app.sign_up("leo").await;

    let response = app
        .post_form(
            "/auth/signup/",
            None,
            "username=leo&password1=war-and-peace&password2=war-and-peace",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());

    let html = body_text(response).await;
    assert_eq!(page_name(&html), Some("users/signup.html"));
    assert!(html.contains("already exists"));
}

#[tokio::test]
async fn login_honours_local_next_only() {
    let app = TestApp::new();
    app.sign_up("leo").await;

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &format!("username=leo&password={PASSWORD}&next=/create/"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/create/");
    assert!(session_cookie(&response).is_some());

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &format!("username=leo&password={PASSWORD}&next=https://evil.example/"),
        )
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn wrong_password_rerenders_login() {
    let app = TestApp::new();
    app.sign_up("leo").await;

    let response = app
        .post_form("/auth/login/", None, "username=leo&password=nope")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());

    let html = body_text(response).await;
    assert_eq!(page_name(&html), Some("users/login.html"));
    assert!(html.contains("Please enter a correct username and password"));
}

#[tokio::test]
async fn login_form_keeps_next_in_hidden_field() {
    let app = TestApp::new();

    let html = body_text(app.get("/auth/login/?next=/follow/", None).await).await;
    assert!(html.contains("value=\"/follow/\""));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_up("leo").await;

    let response = app.get("/auth/logout/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let response = app.get("/create/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=/create/");
}
