//! Authentication integration tests.
//!
//! Tests verify:
//! - The pre-encoded credential is accepted verbatim
//! - Missing or wrong credentials get 401 with a Basic challenge
//! - The check runs before routing, for every path

use axum::http::StatusCode;

use super::test_utils::{body_bytes, get, router_for, world_dir, PNG_TILE};

/// base64 of `user:pass`.
const CREDENTIAL: &str = "dXNlcjpwYXNz";

#[tokio::test]
async fn test_missing_header_rejected() {
    let dir = world_dir();
    let response = get(router_for(dir.path(), CREDENTIAL), "/maps/", &[]).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Basic realm=\"Maps\""
    );
}

#[tokio::test]
async fn test_correct_header_accepted() {
    let dir = world_dir();
    let response = get(
        router_for(dir.path(), CREDENTIAL),
        "/maps/",
        &[("authorization", "Basic dXNlcjpwYXNz")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authenticated_tile_request() {
    let dir = world_dir();
    let response = get(
        router_for(dir.path(), CREDENTIAL),
        "/maps/map/world.mbtiles/1/0/0",
        &[("authorization", "Basic dXNlcjpwYXNz")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], &PNG_TILE);
}

#[tokio::test]
async fn test_wrong_credentials_rejected() {
    let dir = world_dir();

    for value in [
        "Basic dXNlcjp3cm9uZw==",
        "Basic user:pass",
        "Bearer dXNlcjpwYXNz",
        "dXNlcjpwYXNz",
    ] {
        let response = get(
            router_for(dir.path(), CREDENTIAL),
            "/maps/map/world.mbtiles/1/0/0",
            &[("authorization", value)],
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        assert!(response.headers().contains_key("www-authenticate"));
    }
}

#[tokio::test]
async fn test_auth_runs_before_routing() {
    let dir = world_dir();

    // Unknown routes and paths outside the mount are challenged, not 404.
    for uri in ["/elsewhere", "/maps/map/missing.mbtiles/0/0/0", "/maps/web/viewer.js"] {
        let response = get(router_for(dir.path(), CREDENTIAL), uri, &[]).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_no_credential_means_public() {
    let dir = world_dir();
    let response = get(router_for(dir.path(), ""), "/maps/map/world.mbtiles/1/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
}
