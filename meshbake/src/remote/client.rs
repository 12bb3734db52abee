//! Remote job client traits and the HTTP implementation.
//!
//! The processing node exposes:
//!
//! - `GET {base}/task/{id}/info` returning `{"status": .., "progress": ..}`
//!   where `status` is either a bare integer or `{"code": integer}`
//! - `GET {base}/task/{id}/download/{archive}` returning the packaged output
//!
//! Both endpoints take the service token as a `token` query parameter. A
//! user's bearer token, when present, is sent as `Authorization: Bearer`.

use std::future::Future;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use serde::Deserialize;
use tracing::debug;

use super::{RemoteConfig, RemoteError};
use crate::job::{Credential, RemoteJob};

/// Fetches the current status of a remote job.
pub trait JobStatusSource: Send + Sync {
    fn fetch_status(
        &self,
        job_id: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<RemoteJob, RemoteError>> + Send;
}

/// Downloads the packaged output archive of a finished job.
pub trait ArchiveSource: Send + Sync {
    fn fetch_archive(
        &self,
        job_id: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<Bytes, RemoteError>> + Send;
}

impl<T: JobStatusSource> JobStatusSource for Arc<T> {
    fn fetch_status(
        &self,
        job_id: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<RemoteJob, RemoteError>> + Send {
        (**self).fetch_status(job_id, credential)
    }
}

impl<T: ArchiveSource> ArchiveSource for Arc<T> {
    fn fetch_archive(
        &self,
        job_id: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<Bytes, RemoteError>> + Send {
        (**self).fetch_archive(job_id, credential)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusField {
    Code(i64),
    Object { code: i64 },
}

impl StatusField {
    fn code(&self) -> i64 {
        match self {
            StatusField::Code(code) | StatusField::Object { code } => *code,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InfoResponse {
    Info {
        status: StatusField,
        #[serde(default)]
        progress: f64,
    },
    Error {
        error: String,
    },
}

/// Parses a job info body into a [`RemoteJob`].
fn parse_info(job_id: &str, body: &[u8]) -> Result<RemoteJob, RemoteError> {
    let info: InfoResponse =
        serde_json::from_slice(body).map_err(|e| RemoteError::Json(e.to_string()))?;
    match info {
        InfoResponse::Info { status, progress } => {
            Ok(RemoteJob::new(job_id, status.code(), progress))
        }
        InfoResponse::Error { error } => Err(RemoteError::Api(error)),
    }
}

/// HTTP client for a processing node.
///
/// Uses a reusable `reqwest::Client` with connection pooling and timeouts.
#[derive(Clone)]
pub struct HttpJobClient {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl HttpJobClient {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("meshbake/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn request(&self, url: String, credential: &Credential) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(token) = &credential.service_token {
            request = request.query(&[("token", token)]);
        }
        if let Some(token) = &credential.bearer_token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, url: String, credential: &Credential) -> Result<reqwest::Response, RemoteError> {
        let response = self.request(url.clone(), credential).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response)
    }
}

impl JobStatusSource for HttpJobClient {
    async fn fetch_status(
        &self,
        job_id: &str,
        credential: &Credential,
    ) -> Result<RemoteJob, RemoteError> {
        let url = format!("{}/task/{}/info", self.config.base(), job_id);
        let body = self.send(url, credential).await?.bytes().await?;
        let job = parse_info(job_id, &body)?;

        debug!(
            job_id,
            status_code = job.status_code,
            progress = job.progress,
            "Job status fetched"
        );
        Ok(job)
    }
}

impl ArchiveSource for HttpJobClient {
    async fn fetch_archive(
        &self,
        job_id: &str,
        credential: &Credential,
    ) -> Result<Bytes, RemoteError> {
        let url = format!(
            "{}/task/{}/download/{}",
            self.config.base(),
            job_id,
            self.config.archive_name
        );
        let max = self.config.max_archive_bytes;

        let mut response = self.send(url, credential).await?;
        if let Some(size) = response.content_length() {
            if size > max {
                return Err(RemoteError::TooLarge { size, max });
            }
        }

        // The declared length may be absent or wrong; enforce the bound
        // while streaming too.
        let mut buffer = BytesMut::with_capacity(
            response.content_length().unwrap_or(0).min(max) as usize,
        );
        while let Some(chunk) = response.chunk().await? {
            let size = (buffer.len() + chunk.len()) as u64;
            if size > max {
                return Err(RemoteError::TooLarge { size, max });
            }
            buffer.extend_from_slice(&chunk);
        }

        debug!(job_id, bytes = buffer.len(), "Archive downloaded");
        Ok(buffer.freeze())
    }
}
