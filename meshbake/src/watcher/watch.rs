//! Poll loop and watch handles.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::{WatchError, WatcherConfig};
use crate::job::{Credential, JobStatus, RemoteJob};
use crate::remote::JobStatusSource;

/// Progress reported by a running watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Status or progress differs from the previous poll.
    StatusChanged { status: JobStatus, progress: u8 },

    /// A poll failed with a retryable error.
    TransientError { attempt: u32, error: String },

    /// A terminal status was observed; no further polls follow.
    Terminal(JobStatus),
}

/// Polls jobs on a [`JobStatusSource`].
pub struct JobWatcher<S> {
    source: Arc<S>,
    config: WatcherConfig,
}

impl<S> Clone for JobWatcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

impl<S: JobStatusSource + 'static> JobWatcher<S> {
    pub fn new(source: S, config: WatcherConfig) -> Self {
        Self::from_arc(Arc::new(source), config)
    }

    pub fn from_arc(source: Arc<S>, config: WatcherConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Polls until the job reaches a terminal status.
    ///
    /// Returns the final snapshot when the job completed. Failed and
    /// canceled jobs surface as [`WatchError::JobFailed`] and
    /// [`WatchError::JobCanceled`].
    pub async fn poll(
        &self,
        job_id: &str,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<RemoteJob, WatchError> {
        poll_until_terminal(
            self.source.as_ref(),
            &self.config,
            job_id,
            credential,
            cancel,
            None,
        )
        .await
    }

    /// Starts watching a job in the background.
    ///
    /// `on_complete` runs once, on the watch task, when the job completes.
    /// It never runs for failed or canceled jobs, or after the watch was
    /// cancelled. Dropping the returned handle cancels the watch.
    pub fn watch<F, Fut, T>(
        &self,
        job_id: impl Into<String>,
        credential: Credential,
        on_complete: F,
    ) -> WatchHandle<T>
    where
        F: FnOnce(RemoteJob) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn_watch(job_id.into(), credential, CancellationToken::new(), on_complete)
    }

    /// Like [`watch`](Self::watch), cancelled as well when `parent` is.
    pub fn watch_with_cancel<F, Fut, T>(
        &self,
        job_id: impl Into<String>,
        credential: Credential,
        parent: &CancellationToken,
        on_complete: F,
    ) -> WatchHandle<T>
    where
        F: FnOnce(RemoteJob) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn_watch(job_id.into(), credential, parent.child_token(), on_complete)
    }

    fn spawn_watch<F, Fut, T>(
        &self,
        job_id: String,
        credential: Credential,
        cancel: CancellationToken,
        on_complete: F,
    ) -> WatchHandle<T>
    where
        F: FnOnce(RemoteJob) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let source = Arc::clone(&self.source);
        let config = self.config.clone();
        let task_cancel = cancel.clone();
        let task_job_id = job_id.clone();

        let task = tokio::spawn(async move {
            let job = poll_until_terminal(
                source.as_ref(),
                &config,
                &task_job_id,
                &credential,
                &task_cancel,
                Some(&events_tx),
            )
            .await?;

            if task_cancel.is_cancelled() {
                return Err(WatchError::Cancelled);
            }

            info!(job_id = %task_job_id, "Job completed, running completion callback");
            Ok(on_complete(job).await)
        });

        WatchHandle {
            job_id,
            events: events_rx,
            guard: Some(cancel.clone().drop_guard()),
            cancel,
            task,
        }
    }
}

/// Handle to a background watch.
///
/// Dropping the handle cancels the watch.
pub struct WatchHandle<T> {
    job_id: String,
    events: mpsc::UnboundedReceiver<WatchEvent>,
    cancel: CancellationToken,
    guard: Option<DropGuard>,
    task: JoinHandle<Result<T, WatchError>>,
}

impl<T> WatchHandle<T> {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stops the watch. No poll starts and no callback fires afterwards.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Next progress event, or `None` once the watch has ended and all
    /// events were consumed.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }

    /// Waits for the watch to end and returns the callback's output.
    pub async fn wait(mut self) -> Result<T, WatchError> {
        let result = match (&mut self.task).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(WatchError::Cancelled),
            Err(e) => Err(WatchError::Internal(e.to_string())),
        };
        if let Some(guard) = self.guard.take() {
            guard.disarm();
        }
        result
    }
}

async fn poll_until_terminal<S: JobStatusSource + ?Sized>(
    source: &S,
    config: &WatcherConfig,
    job_id: &str,
    credential: &Credential,
    cancel: &CancellationToken,
    events: Option<&mpsc::UnboundedSender<WatchEvent>>,
) -> Result<RemoteJob, WatchError> {
    let emit = |event: WatchEvent| {
        if let Some(tx) = events {
            // The receiver may have been dropped; the watch continues.
            let _ = tx.send(event);
        }
    };

    debug!(
        job_id,
        poll_interval_secs = config.poll_interval.as_secs_f64(),
        "Watching job"
    );

    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last: Option<(JobStatus, u8)> = None;
    let mut consecutive_errors: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WatchError::Cancelled),
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WatchError::Cancelled),
            result = tokio::time::timeout(
                config.request_timeout,
                source.fetch_status(job_id, credential),
            ) => result,
        };

        let failure = match result {
            Ok(Ok(job)) => {
                consecutive_errors = 0;
                let status = job.status();
                let snapshot = (status, job.progress);

                if last != Some(snapshot) {
                    if status == JobStatus::Unknown {
                        warn!(job_id, status_code = job.status_code, "Unknown job status code");
                    } else {
                        info!(job_id, status = %status, progress = job.progress, "Job status changed");
                    }
                    emit(WatchEvent::StatusChanged {
                        status,
                        progress: job.progress,
                    });
                    last = Some(snapshot);
                }

                match status {
                    JobStatus::Completed => {
                        emit(WatchEvent::Terminal(status));
                        return Ok(job);
                    }
                    JobStatus::Failed => {
                        emit(WatchEvent::Terminal(status));
                        return Err(WatchError::JobFailed {
                            job_id: job_id.to_string(),
                            progress: job.progress,
                        });
                    }
                    JobStatus::Canceled => {
                        emit(WatchEvent::Terminal(status));
                        return Err(WatchError::JobCanceled {
                            job_id: job_id.to_string(),
                        });
                    }
                    JobStatus::Queued | JobStatus::Running | JobStatus::Unknown => continue,
                }
            }
            Ok(Err(e)) if !e.is_transient() => {
                warn!(job_id, error = %e, "Status request rejected");
                return Err(WatchError::Remote(e));
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "status request timed out after {:?}",
                config.request_timeout
            ),
        };

        consecutive_errors += 1;
        warn!(
            job_id,
            error = %failure,
            consecutive_errors,
            "Transient status poll failure"
        );
        emit(WatchEvent::TransientError {
            attempt: consecutive_errors,
            error: failure.clone(),
        });

        if consecutive_errors > config.max_transient_retries {
            return Err(WatchError::TransientPoll {
                attempts: consecutive_errors,
                last_error: failure,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const QUEUED_CODE: i64 = JobStatus::QUEUED_CODE;
    const RUNNING_CODE: i64 = JobStatus::RUNNING_CODE;
    const FAILED_CODE: i64 = JobStatus::FAILED_CODE;
    const COMPLETED_CODE: i64 = JobStatus::COMPLETED_CODE;
    const CANCELED_CODE: i64 = JobStatus::CANCELED_CODE;

    /// Replays a script of responses; repeats "running" once exhausted.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<(i64, f64), RemoteError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<(i64, f64), RemoteError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn codes(codes: &[i64]) -> Self {
            Self::new(codes.iter().map(|c| Ok((*c, 0.0))).collect())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JobStatusSource for ScriptedSource {
        async fn fetch_status(
            &self,
            job_id: &str,
            _credential: &Credential,
        ) -> Result<RemoteJob, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().pop_front();
            match next {
                Some(Ok((code, progress))) => Ok(RemoteJob::new(job_id, code, progress)),
                Some(Err(e)) => Err(e),
                None => Ok(RemoteJob::new(job_id, RUNNING_CODE, 50.0)),
            }
        }
    }

    fn fast_config() -> WatcherConfig {
        WatcherConfig {
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            max_transient_retries: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_fires_once_on_completion() {
        let source = Arc::new(ScriptedSource::codes(&[
            QUEUED_CODE,
            RUNNING_CODE,
            RUNNING_CODE,
            COMPLETED_CODE,
        ]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_cb = Arc::clone(&fired);
        let mut handle = watcher.watch("job-c", Credential::anonymous(), move |job| async move {
            fired_cb.fetch_add(1, Ordering::SeqCst);
            job.job_id
        });

        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        let result = handle.wait().await.unwrap();

        assert_eq!(result, "job-c");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls(), 4);
        assert_eq!(
            events,
            vec![
                WatchEvent::StatusChanged { status: JobStatus::Queued, progress: 0 },
                WatchEvent::StatusChanged { status: JobStatus::Running, progress: 0 },
                WatchEvent::StatusChanged { status: JobStatus::Completed, progress: 0 },
                WatchEvent::Terminal(JobStatus::Completed),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_never_fires_callback() {
        let source = ScriptedSource::codes(&[RUNNING_CODE, FAILED_CODE]);
        let watcher = JobWatcher::new(source, fast_config());
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_cb = Arc::clone(&fired);
        let handle = watcher.watch("job-d", Credential::anonymous(), move |_| async move {
            fired_cb.fetch_add(1, Ordering::SeqCst);
        });

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, WatchError::JobFailed { ref job_id, .. } if job_id == "job-d"));
        assert!(err.is_job_terminal());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_canceled_job() {
        let watcher = JobWatcher::new(ScriptedSource::codes(&[CANCELED_CODE]), fast_config());
        let err = watcher
            .poll("job", &Credential::anonymous(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::JobCanceled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_codes_keep_polling() {
        let source = Arc::new(ScriptedSource::codes(&[99, 0, COMPLETED_CODE]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());
        let job = watcher
            .poll("job", &Credential::anonymous(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(RemoteError::Timeout),
            Err(RemoteError::Status { status: 503, url: String::new() }),
            Ok((RUNNING_CODE, 10.0)),
            Err(RemoteError::Connect("refused".into())),
            Ok((COMPLETED_CODE, 100.0)),
        ]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());
        let job = watcher
            .poll("job", &Credential::anonymous(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(job.progress, 100);
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_escalate() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(RemoteError::Timeout),
            Err(RemoteError::Timeout),
            Err(RemoteError::Timeout),
            Ok((COMPLETED_CODE, 100.0)),
        ]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_cb = Arc::clone(&fired);
        let handle = watcher.watch("job", Credential::anonymous(), move |_| async move {
            fired_cb.fetch_add(1, Ordering::SeqCst);
        });

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, WatchError::TransientPoll { attempts: 3, .. }));
        assert!(!err.is_job_terminal());
        assert_eq!(source.calls(), 3);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_status_request_times_out() {
        let source = Arc::new(ScriptedSource {
            delay: Some(Duration::from_secs(60)),
            ..ScriptedSource::codes(&[COMPLETED_CODE])
        });
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());

        let err = watcher
            .poll("job", &Credential::anonymous(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            WatchError::TransientPoll { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_surfaces() {
        let source = ScriptedSource::new(vec![Err(RemoteError::Api("no such task".into()))]);
        let watcher = JobWatcher::new(source, fast_config());
        let err = watcher
            .poll("job", &Credential::anonymous(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Remote(RemoteError::Api(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        // Never completes on its own.
        let source = Arc::new(ScriptedSource::codes(&[]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_cb = Arc::clone(&fired);
        let handle = watcher.watch("job", Credential::anonymous(), move |_| async move {
            fired_cb.fetch_add(1, Ordering::SeqCst);
        });

        // Polls at t=0, 5 and 10.
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(source.calls(), 3);

        handle.cancel();
        assert!(matches!(handle.wait().await, Err(WatchError::Cancelled)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let source = Arc::new(ScriptedSource::codes(&[]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());

        let handle = watcher.watch("job", Credential::anonymous(), |_| async {});
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_token_cancels_child_watches() {
        let source = Arc::new(ScriptedSource::codes(&[]));
        let watcher = JobWatcher::from_arc(Arc::clone(&source), fast_config());
        let parent = CancellationToken::new();

        let a = watcher.watch_with_cancel("a", Credential::anonymous(), &parent, |_| async {});
        let b = watcher.watch_with_cancel("b", Credential::anonymous(), &parent, |_| async {});
        tokio::time::sleep(Duration::from_secs(1)).await;
        parent.cancel();

        assert!(matches!(a.wait().await, Err(WatchError::Cancelled)));
        assert!(matches!(b.wait().await, Err(WatchError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_watches() {
        let done = Arc::new(ScriptedSource::codes(&[COMPLETED_CODE]));
        let failed = Arc::new(ScriptedSource::codes(&[FAILED_CODE]));
        let done_watcher = JobWatcher::from_arc(done, fast_config());
        let failed_watcher = JobWatcher::from_arc(failed, fast_config());

        let a = done_watcher.watch("a", Credential::anonymous(), |job| async move { job.job_id });
        let b = failed_watcher.watch("b", Credential::anonymous(), |job| async move { job.job_id });

        assert_eq!(a.wait().await.unwrap(), "a");
        assert!(b.wait().await.unwrap_err().is_job_terminal());
    }
}
