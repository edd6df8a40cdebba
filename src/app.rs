use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, profiles};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(profiles::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register_and_login(app: &Router, email: &str, username: &str) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/users",
            None,
            Some(json!({"user": {"email": email, "password": "pw123", "username": username}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"user": {"email": email, "password": "pw123"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["user"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let app = build_app(AppState::fake());

        let (status, body) = call(&app, Method::GET, "/api/user", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = call(&app, Method::GET, "/api/user", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_and_current_user() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "alice@x.com", "alice").await;

        let (status, body) = call(&app, Method::GET, "/api/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"]["token"].as_str().is_some());
        assert!(body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_and_bad_login_map_to_status_codes() {
        let app = build_app(AppState::fake());
        register_and_login(&app, "alice@x.com", "alice").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/users",
            None,
            Some(json!({"user": {"email": "alice@x.com", "password": "pw456", "username": "alice2"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "user already exists");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"user": {"email": "alice@x.com", "password": "wrong"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"user": {"email": "alice@x.com"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_user_over_http() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "alice@x.com", "alice").await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/user",
            Some(&token),
            Some(json!({"user": {"bio": "hello", "image": "https://img/a.png"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["bio"], "hello");

        let (status, _) = call(&app, Method::PUT, "/api/user", Some(&token), Some(json!({"user": {}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn follow_flow_over_http() {
        let app = build_app(AppState::fake());
        let alice = register_and_login(&app, "alice@x.com", "alice").await;
        let bob = register_and_login(&app, "bob@x.com", "bob").await;

        let (status, body) = call(&app, Method::GET, "/api/profiles/alice", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["following"], false);

        for _ in 0..2 {
            let (status, body) =
                call(&app, Method::POST, "/api/profiles/alice/follow", Some(&bob), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["profile"]["following"], true);
        }

        let (_, body) = call(&app, Method::GET, "/api/profiles/alice", Some(&bob), None).await;
        assert_eq!(body["profile"]["following"], true);

        let (status, body) =
            call(&app, Method::DELETE, "/api/profiles/alice/follow", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["following"], false);

        let (_, body) = call(&app, Method::GET, "/api/profiles/alice", Some(&bob), None).await;
        assert_eq!(body["profile"]["following"], false);

        let (status, _) =
            call(&app, Method::POST, "/api/profiles/alice/follow", Some(&alice), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::GET, "/api/profiles/nobody", Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
