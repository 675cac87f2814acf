//! Integration tests for the reqwest-backed fetcher against a wiremock origin
//!
//! Exercises the real HTTP path the production fetcher takes: happy path,
//! non-2xx statuses, and empty bodies, plus the end-to-end scenario of the
//! full service running against a live (local) origin.

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use imgd_core::cache::{FitMode, ImageClass, TransformKey};
use imgd_core::config::ServiceConfig;
use imgd_core::errors::{FetchError, ImgdError};
use imgd_core::fetch::{ReqwestFetcher, SourceFetcher};
use imgd_core::service::TransformService;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgb::<u8>([200, 30, 90]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_fetch_returns_body_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_fixture(10, 10)))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new().unwrap();
    let bytes = fetcher
        .fetch(&format!("{}/profile.png", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, png_fixture(10, 10));
}

#[tokio::test]
async fn test_fetch_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new().unwrap();
    let err = fetcher
        .fetch(&format!("{}/missing.png", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_empty_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new().unwrap();
    let err = fetcher
        .fetch(&format!("{}/empty.png", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody { .. }));
}

#[tokio::test]
async fn test_end_to_end_cold_cache_scenario() {
    let server = MockServer::start().await;
    // The origin must be hit exactly once across both requests
    Mock::given(method("GET"))
        .and(path("/profile.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_fixture(400, 400)))
        .expect(1)
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let config = ServiceConfig {
        cache_root: cache_dir.path().to_path_buf(),
        static_origin: server.uri(),
        generated_origin: format!("{}/generate", server.uri()),
        ..ServiceConfig::default()
    };
    let service = TransformService::new(config, Arc::new(ReqwestFetcher::new().unwrap()));

    let key = TransformKey::new(
        ImageClass::Public,
        "profile.png",
        Some(160),
        Some(160),
        FitMode::Cover,
    )
    .unwrap();

    let first = service.get(&key).await.unwrap();
    assert_eq!(first.content_type, "image/webp");
    let decoded = image::load_from_memory(&first.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (160, 160));
    assert!(service.cache().entry_path(&key).exists());

    let second = service.get(&key).await.unwrap();
    assert!(second.timings.cache_hit);
    assert_eq!(second.bytes, first.bytes);
}

#[tokio::test]
async fn test_server_error_from_origin_creates_no_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let config = ServiceConfig {
        cache_root: cache_dir.path().to_path_buf(),
        static_origin: server.uri(),
        generated_origin: format!("{}/generate", server.uri()),
        ..ServiceConfig::default()
    };
    let service = TransformService::new(config, Arc::new(ReqwestFetcher::new().unwrap()));

    let key = TransformKey::new(
        ImageClass::Public,
        "profile.png",
        Some(160),
        Some(160),
        FitMode::Cover,
    )
    .unwrap();

    let err = service.get(&key).await.unwrap_err();
    assert!(matches!(err, ImgdError::Fetch(FetchError::Status { status: 500, .. })));
    assert!(!service.cache().entry_path(&key).exists());
}
