//! API integration tests for tile and metadata retrieval.
//!
//! Tests verify:
//! - XYZ requests hit the right TMS row
//! - Missing tiles are 404, broken archives are 500
//! - Tile response headers (content type, CORS, gzip)
//! - Metadata JSON normalization
//! - Mount prefix and route matching

use axum::http::StatusCode;
use serde_json::json;
use tempfile::TempDir;

use super::test_utils::{
    body_bytes, body_json, create_mbtiles, get, router_for, world_dir, TileRow, GZIP_TILE,
    PNG_TILE,
};

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_coordinate_conversion() {
    let dir = world_dir();
    let router = router_for(dir.path(), "");

    // XYZ y=0 at z=1 is TMS row 1.
    let response = get(router, "/maps/map/world.mbtiles/1/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(&body[..], &PNG_TILE);
}

#[tokio::test]
async fn test_missing_tile_is_not_found() {
    let dir = world_dir();

    let response = get(router_for(dir.path(), ""), "/maps/map/world.mbtiles/1/0/99", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // y=1 at z=1 is TMS row 0, which is not stored.
    let response = get(router_for(dir.path(), ""), "/maps/map/world.mbtiles/1/0/1", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error = body_json(response).await;
    assert_eq!(error["error"], "not_found");
}

#[tokio::test]
async fn test_unaddressable_zoom_is_not_found() {
    let dir = world_dir();

    for uri in [
        "/maps/map/world.mbtiles/-1/0/0",
        "/maps/map/world.mbtiles/64/0/0",
        "/maps/map/world.mbtiles/99999999999/0/0",
    ] {
        let response = get(router_for(dir.path(), ""), uri, &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_tile_rows_across_zoom_levels() {
    let dir = TempDir::new().unwrap();
    let mut tiles = Vec::new();
    for z in 0..5i64 {
        for y in 0..(1i64 << z) {
            let tms = (1i64 << z) - 1 - y;
            tiles.push(TileRow::new(z, 0, tms, format!("{z}/{y}").as_bytes()));
        }
    }
    create_mbtiles(dir.path(), "grid.mbtiles", &[], &tiles);

    for z in 0..5i64 {
        for y in 0..(1i64 << z) {
            let uri = format!("/maps/map/grid.mbtiles/{z}/0/{y}");
            let response = get(router_for(dir.path(), ""), &uri, &[]).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let body = body_bytes(response).await;
            assert_eq!(&body[..], format!("{z}/{y}").as_bytes());
        }
    }
}

#[tokio::test]
async fn test_tile_headers() {
    let dir = world_dir();
    let response = get(router_for(dir.path(), ""), "/maps/map/world.mbtiles/1/0/0", &[]).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/x-protobuf"
    );
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert!(response.headers().get("content-encoding").is_none());
}

#[tokio::test]
async fn test_gzip_tile_declares_encoding() {
    let dir = TempDir::new().unwrap();
    create_mbtiles(
        dir.path(),
        "vector.mbtiles",
        &[("format", "pbf")],
        &[TileRow::new(0, 0, 0, &GZIP_TILE)],
    );

    let response = get(router_for(dir.path(), ""), "/maps/map/vector.mbtiles/0/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-encoding").unwrap(), "gzip");

    // The blob is passed through untouched.
    let body = body_bytes(response).await;
    assert_eq!(&body[..], &GZIP_TILE);
}

#[tokio::test]
async fn test_tile_in_nested_directory() {
    let dir = TempDir::new().unwrap();
    create_mbtiles(
        dir.path(),
        "europe/italy.mbtiles",
        &[],
        &[TileRow::new(2, 2, 2, &PNG_TILE)],
    );

    let response = get(
        router_for(dir.path(), ""),
        "/maps/map/europe/italy.mbtiles/2/2/1",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_text_tile_data_served() {
    let dir = TempDir::new().unwrap();
    let path = create_mbtiles(dir.path(), "text.mbtiles", &[], &[]);
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("INSERT INTO tiles VALUES (0, 0, 0, 'abc');")
        .unwrap();

    let response = get(router_for(dir.path(), ""), "/maps/map/text.mbtiles/0/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"abc");
}

#[tokio::test]
async fn test_tile_from_missing_archive() {
    let dir = world_dir();
    let response = get(router_for(dir.path(), ""), "/maps/map/nope.mbtiles/0/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tile_from_corrupt_archive() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("broken.mbtiles"),
        b"this file is not a sqlite database at all, only some text",
    )
    .unwrap();

    let response = get(router_for(dir.path(), ""), "/maps/map/broken.mbtiles/0/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error = body_json(response).await;
    assert_eq!(error["error"], "database_error");
}

#[tokio::test]
async fn test_tile_coordinates_on_pmtiles_not_found() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("world.pmtiles"), b"PMTiles\x03").unwrap();

    let response = get(router_for(dir.path(), ""), "/maps/map/world.pmtiles/0/0/0", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Metadata
// =============================================================================

#[tokio::test]
async fn test_metadata_json() {
    let dir = world_dir();
    let response = get(
        router_for(dir.path(), ""),
        "/maps/map/world.mbtiles/metadata.json",
        &[],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let metadata = body_json(response).await;
    assert_eq!(metadata["name"], "Test Map");
    assert_eq!(metadata["format"], "png");
}

#[tokio::test]
async fn test_metadata_normalization() {
    let dir = TempDir::new().unwrap();
    create_mbtiles(
        dir.path(),
        "typed.mbtiles",
        &[
            ("minzoom", "5"),
            ("maxzoom", "\"14\""),
            ("json", "{\"vector_layers\":[{\"id\":\"roads\"}]}"),
            ("center", "[11.2,43.7,6]"),
            ("attribution", "<a href=\"https://example.com\">Example</a>"),
            ("bounds", "-180,-85,180,85"),
        ],
        &[],
    );

    let response = get(
        router_for(dir.path(), ""),
        "/maps/map/typed.mbtiles/metadata.json",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let metadata = body_json(response).await;
    assert_eq!(metadata["minzoom"], json!(5));
    assert_eq!(metadata["maxzoom"], json!(14));
    assert_eq!(metadata["json"], json!({"vector_layers": [{"id": "roads"}]}));
    assert_eq!(metadata["center"], json!([11.2, 43.7, 6]));
    assert_eq!(
        metadata["attribution"],
        json!("<a href=\"https://example.com\">Example</a>")
    );
    assert_eq!(metadata["bounds"], json!("-180,-85,180,85"));
}

#[tokio::test]
async fn test_metadata_missing_table_is_server_error() {
    let dir = TempDir::new().unwrap();
    rusqlite::Connection::open(dir.path().join("tiles-only.mbtiles"))
        .unwrap()
        .execute_batch("CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);")
        .unwrap();

    let response = get(
        router_for(dir.path(), ""),
        "/maps/map/tiles-only.mbtiles/metadata.json",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_metadata_missing_archive_is_not_found() {
    let dir = world_dir();
    let response = get(
        router_for(dir.path(), ""),
        "/maps/map/nope.mbtiles/metadata.json",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_root_informational_response() {
    let dir = world_dir();

    for uri in ["/maps/", "/maps//"] {
        let response = get(router_for(dir.path(), ""), uri, &[]).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_bytes(response).await;
        assert!(std::str::from_utf8(&body)
            .unwrap()
            .contains("Map server running"));
    }
}

#[tokio::test]
async fn test_path_outside_mount_not_found() {
    let dir = world_dir();

    for uri in ["/", "/other/map/world.mbtiles/1/0/0", "/maps"] {
        let response = get(router_for(dir.path(), ""), uri, &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_routes_not_found() {
    let dir = world_dir();

    for uri in [
        "/maps/tiles/world.mbtiles",
        "/maps/map/world.txt",
        "/maps/map/world.mbtiles/1/0/0.pbf",
        "/maps/map/",
    ] {
        let response = get(router_for(dir.path(), ""), uri, &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_percent_encoded_archive_name() {
    let dir = TempDir::new().unwrap();
    create_mbtiles(
        dir.path(),
        "my map.mbtiles",
        &[],
        &[TileRow::new(0, 0, 0, &PNG_TILE)],
    );

    let response = get(
        router_for(dir.path(), ""),
        "/maps/map/my%20map.mbtiles/0/0/0",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
