//! Router-level tests. The pool is lazy, so paths that reject before any
//! query runs are exercised without a database.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Extension;
use axum::Router;
use foodflow::api::handlers::auth::{AuthConfig, AuthState};
use foodflow::api::router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Result<Router> {
    let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
    let auth_state = Arc::new(AuthState::new(AuthConfig::new(
        "http://localhost:5173".to_string(),
    )));
    Ok(router()
        .layer(Extension(auth_state))
        .layer(Extension(pool)))
}

#[tokio::test]
async fn health_is_up() -> Result<()> {
    let response = app()?
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
    Ok(())
}

#[tokio::test]
async fn root_returns_name() -> Result<()> {
    let response = app()?
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn signup_without_payload_is_rejected() -> Result<()> {
    let response = app()?
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/auth/signup")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn listings_require_bearer() -> Result<()> {
    let response = app()?
        .oneshot(Request::builder().uri("/v1/listings").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bookings_require_bearer() -> Result<()> {
    let response = app()?
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bookings")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn session_requires_bearer() -> Result<()> {
    let response = app()?
        .oneshot(
            Request::builder()
                .uri("/v1/auth/session")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let response = app()?
        .oneshot(Request::builder().uri("/v1/unknown").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
