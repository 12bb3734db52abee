use super::coalesce::{Registration, RequestCoalescer};
use super::{AssetArtifact, ServiceError};
use crate::cache::{PutOutcome, ResultCache};
use crate::job::{Credential, JobKey, JobOptions};
use crate::pipeline::{convert_archive, PipelineConfig};
use crate::remote::{ArchiveSource, JobStatusSource};
use crate::watcher::{JobWatcher, WatchHandle};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{spawn_blocking, JoinError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Default bound on downloading one job archive.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

/// Converts finished jobs into cached GLB assets.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct ConversionService<A> {
    archives: A,
    cache: Arc<ResultCache>,
    pipeline: PipelineConfig,
    coalescer: RequestCoalescer,
    fetch_timeout: Duration,
}

fn join_failed(e: JoinError) -> ServiceError {
    ServiceError::Internal(format!("blocking task failed: {e}"))
}

impl<A: ArchiveSource + 'static> ConversionService<A> {
    pub fn new(archives: A, cache: Arc<ResultCache>, pipeline: PipelineConfig) -> Self {
        Self {
            archives,
            cache,
            pipeline,
            coalescer: RequestCoalescer::new(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.pipeline
    }

    pub fn coalescer(&self) -> &RequestCoalescer {
        &self.coalescer
    }

    /// Looks the job up in the result cache only.
    pub async fn cached(&self, key: &JobKey) -> Result<Option<AssetArtifact>, ServiceError> {
        let cache = Arc::clone(&self.cache);
        let job = key.clone();
        let hit = spawn_blocking(move || cache.get(&job))
            .await
            .map_err(join_failed)?
            .map_err(|source| ServiceError::Cache {
                job: key.clone(),
                source,
            })?;

        Ok(hit.map(|bytes| AssetArtifact {
            key: key.clone(),
            bytes,
            path: Some(self.cache.path_for(key)),
            cache_hit: true,
        }))
    }

    /// Returns the job's asset, converting it on a cache miss.
    ///
    /// Concurrent calls for the same key share a single download and
    /// conversion. Nothing is cached when any step fails.
    #[instrument(skip_all, fields(job = %key))]
    pub async fn get_or_convert(
        &self,
        key: &JobKey,
        credential: &Credential,
        options: &JobOptions,
    ) -> Result<AssetArtifact, ServiceError> {
        if let Some(artifact) = self.cached(key).await? {
            debug!("Result cache hit");
            return Ok(artifact);
        }

        match self.coalescer.register(key) {
            Registration::Follower(mut rx) => match rx.recv().await {
                Ok(Ok(artifact)) => Ok(artifact),
                Ok(Err(message)) => Err(ServiceError::Coalesced {
                    job: key.clone(),
                    message,
                }),
                Err(_) => Err(ServiceError::Coalesced {
                    job: key.clone(),
                    message: "conversion was abandoned".to_string(),
                }),
            },
            Registration::Leader(in_flight) => {
                let result = self.convert_uncached(key, credential, options).await;
                in_flight.complete(&result);
                result
            }
        }
    }

    async fn convert_uncached(
        &self,
        key: &JobKey,
        credential: &Credential,
        options: &JobOptions,
    ) -> Result<AssetArtifact, ServiceError> {
        // A conversion may have finished between the lookup and registering.
        if let Some(artifact) = self.cached(key).await? {
            return Ok(artifact);
        }

        let archive = self.fetch(key, credential).await?;
        self.convert_and_store(key, archive, options).await
    }

    async fn fetch(&self, key: &JobKey, credential: &Credential) -> Result<Bytes, ServiceError> {
        let download = self.archives.fetch_archive(key.job_id(), credential);
        match tokio::time::timeout(self.fetch_timeout, download).await {
            Ok(Ok(archive)) => {
                debug!(bytes = archive.len(), "Archive downloaded");
                Ok(archive)
            }
            Ok(Err(source)) => Err(ServiceError::Fetch {
                job: key.clone(),
                source,
            }),
            Err(_) => Err(ServiceError::FetchTimeout {
                job: key.clone(),
                timeout: self.fetch_timeout,
            }),
        }
    }

    async fn convert_and_store(
        &self,
        key: &JobKey,
        archive: Bytes,
        options: &JobOptions,
    ) -> Result<AssetArtifact, ServiceError> {
        let config = self.pipeline.clone().with_options(options);
        let job = key.clone();
        let output = spawn_blocking(move || convert_archive(&job, &archive, &config))
            .await
            .map_err(join_failed)??;

        let summary = *output.asset.summary();
        let bytes = output.asset.into_bytes();

        let cache = Arc::clone(&self.cache);
        let job = key.clone();
        let data = bytes.clone();
        let outcome = spawn_blocking(move || cache.put(&job, &data))
            .await
            .map_err(join_failed)?
            .map_err(|source| ServiceError::Cache {
                job: key.clone(),
                source,
            })?;

        match outcome {
            PutOutcome::Stored(path) => {
                info!(
                    job = %key,
                    bytes = bytes.len(),
                    vertices = summary.vertices,
                    triangles = summary.triangles,
                    textures = summary.textures,
                    path = %path.display(),
                    "Asset stored"
                );
                Ok(AssetArtifact {
                    key: key.clone(),
                    bytes,
                    path: Some(path),
                    cache_hit: false,
                })
            }
            PutOutcome::AlreadyPresent(path) => {
                // Serve the entry already on disk so every caller sees the same bytes.
                debug!(job = %key, "Entry written concurrently, serving stored copy");
                let stored = self.cached(key).await?;
                Ok(match stored {
                    Some(artifact) => AssetArtifact {
                        cache_hit: false,
                        ..artifact
                    },
                    None => AssetArtifact {
                        key: key.clone(),
                        bytes,
                        path: Some(path),
                        cache_hit: false,
                    },
                })
            }
        }
    }

    /// Watches a remote job and converts it once it completes.
    ///
    /// The conversion runs as the watch's completion callback, so it
    /// happens at most once. Cancelling `cancel` (or the returned handle)
    /// stops the watch.
    pub fn watch_job<S: JobStatusSource + 'static>(
        self: &Arc<Self>,
        watcher: &JobWatcher<S>,
        key: JobKey,
        credential: Credential,
        options: JobOptions,
        cancel: &CancellationToken,
    ) -> WatchHandle<Result<AssetArtifact, ServiceError>> {
        let service = Arc::clone(self);
        let download_credential = credential.clone();
        let job_id = key.job_id().to_string();

        watcher.watch_with_cancel(job_id, credential, cancel, move |job| async move {
            info!(job = %key, progress = job.progress, "Remote job completed, converting");
            service
                .get_or_convert(&key, &download_credential, &options)
                .await
        })
    }

    /// Returns the job's asset, waiting for the remote job first if needed.
    ///
    /// A cached result is returned straight away without polling.
    pub async fn run_job<S: JobStatusSource + 'static>(
        self: &Arc<Self>,
        watcher: &JobWatcher<S>,
        key: JobKey,
        credential: Credential,
        options: JobOptions,
        cancel: &CancellationToken,
    ) -> Result<AssetArtifact, ServiceError> {
        if let Some(artifact) = self.cached(&key).await? {
            info!(job = %key, "Result cache hit, skipping watch");
            return Ok(artifact);
        }

        let handle = self.watch_job(watcher, key.clone(), credential, options, cancel);
        handle
            .wait()
            .await
            .map_err(|source| ServiceError::Watch { job: key, source })?
    }
}
