//! Integration tests for the service manager over real sockets.
//!
//! # Purpose
//!
//! These tests drive `ServiceManager` through its public API the way the CLI
//! and GUI entry points do, then talk to the running server with `reqwest`.
//! They verify:
//!
//! - The lifecycle: start, serve, stop, and that the port stops answering.
//! - The state machine errors: a second start, a stop while idle, and two
//!   starts racing for the swap lock.
//! - The HTTP surface: listings, downloads, uploads, traversal rejection and
//!   the upload size cap.
//! - Forced closure of connections that outlive the grace period.
//!
//! Every test binds `127.0.0.1` on a port the OS just reported free.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use skynet_core::{ServiceMode, ServiceSettings};
use skynet_http::infrastructure::{ServerHandle, ServiceError, ServiceManager};
use tokio::io::AsyncWriteExt;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn free_port() -> u32 {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    u32::from(probe.local_addr().unwrap().port())
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn manager_with(settings: ServiceSettings) -> ServiceManager {
    ServiceManager::new(ServiceSettings {
        shutdown_grace: Duration::from_secs(2),
        ..settings
    })
}

async fn start(manager: &ServiceManager, mode: ServiceMode, dir: &Path) -> ServerHandle {
    manager
        .start(mode, LOCALHOST, free_port(), dir)
        .await
        .unwrap()
}

async fn upload(url: &str, name: &str, contents: &[u8]) -> reqwest::Response {
    // Send the filename verbatim so the server sees exactly what was typed.
    let form = Form::new()
        .percent_encode_noop()
        .part("file", Part::bytes(contents.to_vec()).file_name(name.to_string()));
    client().post(url).multipart(form).send().await.unwrap()
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// Start, fetch the landing page, stop, and confirm the port is closed.
#[tokio::test]
async fn test_start_serve_stop_then_connection_refused() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Combined, dir.path()).await;

    // Act
    let before = client().get(handle.url()).send().await.unwrap();
    manager.stop(&handle).await.unwrap();
    let after = client().get(handle.url()).send().await;

    // Assert
    assert_eq!(before.status(), StatusCode::OK);
    assert!(before.text().await.unwrap().contains("/upload-service"));
    assert!(after.is_err(), "server must not answer after stop");
}

#[tokio::test]
async fn test_restart_after_stop_serves_new_mode() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let first = start(&manager, ServiceMode::Download, dir.path()).await;
    manager.stop(&first).await.unwrap();

    let second = start(&manager, ServiceMode::Upload, dir.path()).await;
    let page = client()
        .get(second.url())
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert!(page.contains("<form"));
    manager.stop(&second).await.unwrap();
}

#[tokio::test]
async fn test_second_start_reports_already_running() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Download, dir.path()).await;

    let result = manager
        .start(ServiceMode::Download, LOCALHOST, free_port(), dir.path())
        .await;

    assert!(matches!(result, Err(ServiceError::AlreadyRunning(_))));
    // The first server is untouched.
    let status = client().get(handle.url()).send().await.unwrap().status();
    assert_eq!(status, StatusCode::OK);
    manager.stop(&handle).await.unwrap();
}

#[tokio::test]
async fn test_stop_while_idle_reports_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Download, dir.path()).await;
    manager.stop(&handle).await.unwrap();

    let result = manager.stop(&handle).await;

    assert!(matches!(result, Err(ServiceError::NotRunning)));
}

/// Two starts racing on the swap lock: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_starts_install_exactly_one_server() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let manager = Arc::new(manager_with(ServiceSettings::default()));
    let port = free_port();

    // Act
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let dir = dir.path().to_path_buf();
            tokio::spawn(async move {
                manager
                    .start(ServiceMode::Download, LOCALHOST, port, &dir)
                    .await
            })
        })
        .collect();
    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }

    // Assert
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::AlreadyRunning(_))))
        .count();
    assert_eq!(winners.len(), 1);
    assert_eq!(losers, 1);
    let winner = winners[0].clone();
    manager.stop(&winner).await.unwrap();
}

/// A connection stuck mid-request is aborted once the grace period ends.
#[tokio::test]
async fn test_stop_forces_closure_after_grace() {
    // Arrange: send half a request header and never finish it
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Download, dir.path()).await;
    let mut stuck = tokio::net::TcpStream::connect(handle.local_addr())
        .await
        .unwrap();
    stuck.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Act
    let began = Instant::now();
    manager
        .stop_with_grace(&handle, Duration::from_millis(200))
        .await
        .unwrap();

    // Assert
    assert!(began.elapsed() < Duration::from_secs(5));
    assert!(!manager.is_running().await);
}

// ── HTTP surface ──────────────────────────────────────────────────────────────

/// Download mode on a directory holding `a.txt` = "hello".
#[tokio::test]
async fn test_download_mode_listing_file_and_traversal() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Download, dir.path()).await;
    let base = handle.url();

    // Act
    let listing = client().get(&base).send().await.unwrap().text().await.unwrap();
    let file = client()
        .get(format!("{base}/download/a.txt"))
        .send()
        .await
        .unwrap();
    let escape = client()
        .get(format!("{base}/download/..%2F..%2Fetc%2Fpasswd"))
        .send()
        .await
        .unwrap();

    // Assert
    assert!(listing.contains("href=\"/download/a.txt\""));
    assert_eq!(file.status(), StatusCode::OK);
    assert_eq!(file.bytes().await.unwrap().as_ref(), b"hello");
    assert_eq!(escape.status(), StatusCode::BAD_REQUEST);
    manager.stop(&handle).await.unwrap();
}

#[tokio::test]
async fn test_listing_reflects_current_directory_contents() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Download, dir.path()).await;

    let before = client().get(handle.url()).send().await.unwrap().text().await.unwrap();
    std::fs::write(dir.path().join("late.txt"), b"arrived later").unwrap();
    let after = client().get(handle.url()).send().await.unwrap().text().await.unwrap();

    assert!(!before.contains("late.txt"));
    assert!(after.contains("/download/late.txt"));
    manager.stop(&handle).await.unwrap();
}

/// Combined mode: upload through `/upload-service`, read it back through
/// `/download/<name>`.
#[tokio::test]
async fn test_combined_upload_then_download_round_trip() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Combined, dir.path()).await;
    let base = handle.url();
    let contents: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();

    // Act
    let response = upload(&format!("{base}/upload-service"), "blob.bin", &contents).await;
    let status = response.status();
    let notice = response.text().await.unwrap();
    let fetched = client()
        .get(format!("{base}/download/blob.bin"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(notice.contains("File uploaded successfully"));
    assert!(notice.contains("blob.bin"));
    assert_eq!(fetched.as_ref(), contents.as_slice());
    assert_eq!(std::fs::read(dir.path().join("blob.bin")).unwrap(), contents);
    manager.stop(&handle).await.unwrap();
}

#[tokio::test]
async fn test_upload_over_cap_is_payload_too_large() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings {
        max_upload_bytes: 1024,
        ..ServiceSettings::default()
    });
    let handle = start(&manager, ServiceMode::Upload, dir.path()).await;

    let response = upload(&handle.url(), "big.bin", &[0u8; 8 * 1024]).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!dir.path().join("big.bin").exists());
    // The server keeps running after a rejected request.
    assert!(manager.is_running().await);
    manager.stop(&handle).await.unwrap();
}

#[tokio::test]
async fn test_upload_name_with_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(ServiceSettings::default());
    let handle = start(&manager, ServiceMode::Upload, dir.path()).await;

    let response = upload(&handle.url(), "../outside.txt", b"nope").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!dir.path().parent().unwrap().join("outside.txt").exists());
    manager.stop(&handle).await.unwrap();
}
