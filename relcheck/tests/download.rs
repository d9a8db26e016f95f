//! Artifact download tests against a local stand-in for GitHub and blob storage

mod common;

use std::sync::Arc;

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::json;

use relcheck::app::options::{ArtifactSource, DownloadOptions};
use relcheck::app::run::download;
use relcheck::artifacts::download::BlobDownloader;
use relcheck::errors::VerifyError;
use relcheck::http::client::{HttpClient, RawResponse};
use relcheck::settings::Settings;

use common::{serve, FakeCi};

const TOKEN: &str = "ghs_test_token";

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {}", TOKEN).as_str())
}

/// GitHub-like API: one completed run with a release artifact that redirects
/// to an unauthenticated blob route
async fn fake_github(blob: Vec<u8>) -> String {
    let addr_cell = Arc::new(std::sync::OnceLock::<String>::new());

    let runs_base = addr_cell.clone();
    let artifacts_base = addr_cell.clone();
    let zip_base = addr_cell.clone();

    let router = Router::new()
        .route(
            "/repos/microsoft/onefuzz/actions/workflows/ci.yml/runs",
            get(
                move |headers: HeaderMap, Query(query): Query<std::collections::HashMap<String, String>>| {
                    let base = runs_base.get().cloned().unwrap_or_default();
                    async move {
                        if !authorized(&headers) {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        assert_eq!(query.get("branch").map(String::as_str), Some("main"));
                        assert_eq!(query.get("status").map(String::as_str), Some("completed"));
                        Json(json!({
                            "total_count": 1,
                            "workflow_runs": [{
                                "id": 77,
                                "head_branch": "main",
                                "status": "completed",
                                "artifacts_url": format!("{}/runs/77/artifacts", base)
                            }]
                        }))
                        .into_response()
                    }
                },
            ),
        )
        .route(
            "/runs/77/artifacts",
            get(move |headers: HeaderMap| {
                let base = artifacts_base.get().cloned().unwrap_or_default();
                async move {
                    if !authorized(&headers) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    Json(json!({
                        "total_count": 2,
                        "artifacts": [
                            {"id": 1, "name": "build-logs", "archive_download_url": format!("{}/artifacts/1/zip", base)},
                            {"id": 2, "name": "release-artifacts", "archive_download_url": format!("{}/artifacts/2/zip", base)}
                        ]
                    }))
                    .into_response()
                }
            }),
        )
        .route(
            "/artifacts/2/zip",
            get(move |headers: HeaderMap| {
                let base = zip_base.get().cloned().unwrap_or_default();
                async move {
                    if !authorized(&headers) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    (StatusCode::FOUND, [(header::LOCATION, format!("{}/blob/release.zip", base))])
                        .into_response()
                }
            }),
        )
        .route(
            "/artifacts/gone/zip",
            get(|| async { (StatusCode::GONE, "{\"message\":\"Artifact has expired\"}") }),
        )
        .route(
            "/blob/release.zip",
            get(move |headers: HeaderMap| {
                let blob = blob.clone();
                async move {
                    // Storage URLs are pre-signed; the CI token must not leak there
                    if headers.contains_key(header::AUTHORIZATION) {
                        return StatusCode::BAD_REQUEST.into_response();
                    }
                    blob.into_response()
                }
            }),
        );

    let addr = serve(router).await;
    let base = format!("http://{}", addr);
    addr_cell.set(base.clone()).unwrap();
    base
}

fn github(base: &str) -> Arc<HttpClient> {
    Arc::new(HttpClient::new(base, SecretString::from(TOKEN.to_string())).unwrap())
}

#[tokio::test]
async fn test_redirect_is_followed_and_written_byte_for_byte() {
    let blob = payload(100 * 1024 + 13);
    let base = fake_github(blob.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("onefuzz.zip");

    let downloader = BlobDownloader::new(github(&base)).unwrap();
    let written = downloader
        .download_artifact(&format!("{}/artifacts/2/zip", base), &destination)
        .await
        .unwrap();

    assert_eq!(written, blob.len() as u64);
    assert_eq!(std::fs::read(&destination).unwrap(), blob);
}

#[tokio::test]
async fn test_non_redirect_status_writes_nothing() {
    let base = fake_github(payload(10)).await;
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("onefuzz.zip");

    let downloader = BlobDownloader::new(github(&base)).unwrap();
    let result = downloader
        .download_artifact(&format!("{}/artifacts/gone/zip", base), &destination)
        .await;

    match result {
        Err(VerifyError::UnexpectedResponse { status, body }) => {
            assert_eq!(status, 410);
            assert!(body.contains("expired"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_redirect_without_location_is_unexpected() {
    let ci = Arc::new(FakeCi::default().with_raw_response(RawResponse {
        status: 302,
        location: None,
        body: String::new(),
    }));
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("onefuzz.zip");

    let downloader = BlobDownloader::new(ci).unwrap();
    let result = downloader
        .download_artifact("https://api.github.com/artifacts/1/zip", &destination)
        .await;

    assert!(matches!(result, Err(VerifyError::UnexpectedResponse { status: 302, .. })));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_download_entrypoint_resolves_then_fetches() {
    let blob = payload(40 * 1024);
    let base = fake_github(blob.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut settings = Settings::default();
    settings.github.api_base_url = base.clone();
    let options = DownloadOptions {
        source: ArtifactSource::new(&settings.github, "main"),
        destination: dir.path().join("out").join("release.zip"),
    };

    let written = download(&settings, github(&base), &options).await.unwrap();

    assert_eq!(written, blob.len() as u64);
    assert_eq!(std::fs::read(&options.destination).unwrap(), blob);
}

#[tokio::test]
async fn test_missing_token_is_rejected_by_api() {
    let base = fake_github(payload(10)).await;
    let client = HttpClient::new(&base, SecretString::from("wrong".to_string())).unwrap();

    let response = client
        .get_raw(&format!("{}/artifacts/2/zip", base))
        .await
        .unwrap();

    assert_eq!(response.status, 401);
    assert!(response.location.is_none());
}
