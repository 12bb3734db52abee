//! Watch-then-convert flows against a mock processing node over HTTP.
//!
//! Run with: `cargo test --test job_integration`

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use zip::write::SimpleFileOptions;

use meshbake::cache::ResultCache;
use meshbake::job::{Credential, JobKey, JobOptions};
use meshbake::pipeline::PipelineConfig;
use meshbake::remote::{HttpJobClient, RemoteConfig};
use meshbake::service::{ConversionService, ServiceError};
use meshbake::watcher::{JobWatcher, WatchError, WatcherConfig};

// ============================================================================
// Test Helpers
// ============================================================================

const MESH: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

fn archive() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("odm_texturing/odm_textured_model.obj", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(MESH.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

struct Harness {
    service: Arc<ConversionService<Arc<HttpJobClient>>>,
    watcher: JobWatcher<HttpJobClient>,
    _cache_dir: TempDir,
}

fn harness(server: &mockito::Server) -> Harness {
    let cache_dir = TempDir::new().unwrap();
    let client = Arc::new(HttpJobClient::new(RemoteConfig::new(server.url())).unwrap());
    let cache = Arc::new(ResultCache::new(cache_dir.path()).unwrap());
    let service = Arc::new(ConversionService::new(
        Arc::clone(&client),
        cache,
        PipelineConfig::default(),
    ));
    let watcher = JobWatcher::from_arc(
        client,
        WatcherConfig {
            poll_interval: Duration::from_millis(20),
            request_timeout: Duration::from_secs(5),
            max_transient_retries: 2,
        },
    );
    Harness {
        service,
        watcher,
        _cache_dir: cache_dir,
    }
}

fn credential() -> Credential {
    Credential::new(Some("bearer-1".to_string()), Some("svc-1".to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_completed_job_is_downloaded_converted_and_cached() {
    let mut server = mockito::Server::new_async().await;
    let info = server
        .mock("GET", "/task/job-1/info")
        .match_query(Matcher::UrlEncoded("token".into(), "svc-1".into()))
        .match_header("authorization", "Bearer bearer-1")
        .with_body(r#"{"uuid":"job-1","status":{"code":40},"progress":100}"#)
        .expect(1)
        .create_async()
        .await;
    let download = server
        .mock("GET", "/task/job-1/download/all.zip")
        .match_query(Matcher::UrlEncoded("token".into(), "svc-1".into()))
        .with_body(archive())
        .expect(1)
        .create_async()
        .await;
    let h = harness(&server);
    let key = JobKey::new("p", "job-1").unwrap();

    let artifact = h
        .service
        .run_job(
            &h.watcher,
            key.clone(),
            credential(),
            JobOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!artifact.cache_hit);
    assert_eq!(artifact.content_type(), "model/gltf-binary");
    assert!(h.service.cache().contains(&key));

    // Served from the cache: no further requests reach the node.
    let again = h
        .service
        .run_job(
            &h.watcher,
            key,
            credential(),
            JobOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(again.cache_hit);
    assert_eq!(again.bytes, artifact.bytes);

    info.assert_async().await;
    download.assert_async().await;
}

#[tokio::test]
async fn test_failed_job_never_downloads() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/task/job-2/info")
        .match_query(Matcher::Any)
        .with_body(r#"{"status":30,"progress":12}"#)
        .create_async()
        .await;
    let download = server
        .mock("GET", "/task/job-2/download/all.zip")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let h = harness(&server);
    let key = JobKey::new("p", "job-2").unwrap();

    let err = h
        .service
        .run_job(
            &h.watcher,
            key.clone(),
            credential(),
            JobOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Watch {
            source: WatchError::JobFailed { .. },
            ..
        }
    ));
    assert!(!h.service.cache().contains(&key));
    download.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let mut server = mockito::Server::new_async().await;
    let info = server
        .mock("GET", "/task/job-3/info")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;
    let h = harness(&server);

    let err = h
        .service
        .run_job(
            &h.watcher,
            JobKey::new("p", "job-3").unwrap(),
            Credential::anonymous(),
            JobOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Watch {
            source: WatchError::TransientPoll { attempts: 3, .. },
            ..
        }
    ));
    info.assert_async().await;
}

#[tokio::test]
async fn test_cancel_stops_watch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/task/job-4/info")
        .match_query(Matcher::Any)
        .with_body(r#"{"status":20,"progress":50}"#)
        .create_async()
        .await;
    let h = harness(&server);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let err = h
        .service
        .run_job(
            &h.watcher,
            JobKey::new("p", "job-4").unwrap(),
            Credential::anonymous(),
            JobOptions::default(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Watch {
            source: WatchError::Cancelled,
            ..
        }
    ));
}
