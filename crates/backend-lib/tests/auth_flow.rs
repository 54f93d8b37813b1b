//! End-to-end authentication flow against an on-disk SQLite store.
use std::sync::Arc;

use account_auth_lib::{
    auth::{AuthError, AuthRequest, LoginOutcome},
    config::{DatabaseBackend, Settings},
    open_store,
    router::create_router,
    storage::{UserFilter, UserStore},
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use tempfile::TempDir;
use tower::ServiceExt;

fn settings_in(dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.database.backend = DatabaseBackend::Sqlite;
    settings.database.path = dir.path().join("nested").join("users.db");
    settings.password_hash.scrypt_log_n = 4;
    settings
}

#[tokio::test]
async fn test_register_login_logout() {
    let dir = TempDir::new().unwrap();
    let state = AppState::from_settings(settings_in(&dir)).unwrap();
    let auth = &state.authenticator;

    auth.register("a@b.com", "pw123").await.unwrap();
    let LoginOutcome::LoggedIn { session_id, .. } = auth.login("a@b.com", "pw123").await.unwrap() else {
        panic!("login failed");
    };

    assert!(auth.logout(Some(&session_id)).await.unwrap());
    assert!(!auth.logout(Some(&session_id)).await.unwrap());
}

#[tokio::test]
async fn test_sessions_survive_restart() {
    let dir = TempDir::new().unwrap();

    let session_id = {
        let state = AppState::from_settings(settings_in(&dir)).unwrap();
        state.authenticator.register("a@b.com", "pw123").await.unwrap();
        state.authenticator.create_session("a@b.com").await.unwrap().unwrap()
    };

    let state = AppState::from_settings(settings_in(&dir)).unwrap();
    let request = AuthRequest {
        authorization: None,
        session_cookie: Some(session_id),
    };
    let user = state.authenticator.current_user(&request).await.unwrap().unwrap();
    assert_eq!(user.email, "a@b.com");
    assert!(matches!(
        state.authenticator.register("a@b.com", "again").await,
        Err(AuthError::AlreadyRegistered)
    ));
}

#[tokio::test]
async fn test_http_flow() {
    let dir = TempDir::new().unwrap();
    let app = create_router(Arc::new(AppState::from_settings(settings_in(&dir)).unwrap()));

    let post = |uri: &str, body: &str| {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(post("/api/v1/users", "email=a@b.com&password=pw123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post("/api/v1/auth_session/login", "email=a@b.com&password=pw123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    let cookie_pair = cookie.split(';').next().unwrap().to_string();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let view: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(view["email"], "a@b.com");

    let me = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, &cookie_pair)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(me).await.unwrap().status(), StatusCode::OK);

    for expected in [StatusCode::OK, StatusCode::NOT_FOUND] {
        let logout = Request::builder()
            .method("DELETE")
            .uri("/api/v1/auth_session/logout")
            .header(header::COOKIE, &cookie_pair)
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(logout).await.unwrap().status(), expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_for_one_email() {
    let dir = TempDir::new().unwrap();
    let settings = settings_in(&dir);
    let store = open_store(&settings.database).unwrap();
    let state = AppState::new(store.clone(), settings).unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let auth = state.authenticator.clone();
            tokio::spawn(async move { auth.register("race@b.com", &format!("pw{i}")).await })
        })
        .collect();

    let (mut created, mut taken) = (0, 0);
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AuthError::AlreadyRegistered) => taken += 1,
            Err(other) => panic!("unexpected registration error: {other}"),
        }
    }
    assert_eq!((created, taken), (1, 15));

    let rows = store.find_all_by(&UserFilter::by_email("race@b.com")).await.unwrap();
    assert_eq!(rows.len(), 1);
}
