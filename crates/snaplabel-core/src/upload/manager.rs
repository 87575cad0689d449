use super::model::{ACCEPTED_CONTENT_TYPE, UploadSlot, UploadStatus, UploadTask};
use crate::error::{Result, SnapError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// Transfer progress callback, invoked with cumulative percent (0-100).
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// The transport the upload state machine drives.
///
/// Implemented over the request gateway by the client crate; mocked in tests.
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Asks the backend for a pre-authorized upload destination.
    async fn request_upload_slot(&self) -> Result<UploadSlot>;

    /// Performs the direct binary transfer to the signed URL.
    ///
    /// This path bypasses credential attachment; the destination URL carries
    /// its own authorization. A transport that cannot surface incremental
    /// progress may call `on_progress` once or not at all.
    async fn transfer(
        &self,
        slot: &UploadSlot,
        bytes: Vec<u8>,
        on_progress: ProgressFn,
    ) -> Result<()>;
}

/// Drives a single file through the upload lifecycle.
///
/// `UploadManager` owns the active [`UploadTask`] exclusively. Selecting a
/// new file bumps a monotonic generation counter and replaces the task; any
/// async completion stamped with an older generation is discarded, so an
/// abandoned in-flight upload can never overwrite the current task.
#[derive(Clone)]
pub struct UploadManager {
    backend: Arc<dyn MediaBackend>,
    /// The active task. A std lock so the sync progress callback can update it.
    task: Arc<RwLock<UploadTask>>,
    /// Monotonic selection counter.
    generation: Arc<AtomicU64>,
    /// Broadcast of task snapshots to subscribed consumers.
    notifier: watch::Sender<UploadTask>,
}

impl UploadManager {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        let task = UploadTask::idle(0);
        let (notifier, _) = watch::channel(task.clone());
        Self {
            backend,
            task: Arc::new(RwLock::new(task)),
            generation: Arc::new(AtomicU64::new(0)),
            notifier,
        }
    }

    /// Registers a newly selected file and validates its content type.
    ///
    /// Only `image/png` is accepted; anything else lands in `Failed` with a
    /// type-mismatch message and no network call is ever made for it. The
    /// previous task, whatever its state, is abandoned.
    pub fn select_file(
        &self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> UploadTask {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let content_type = content_type.into();

        let mut task = UploadTask::idle(generation);
        task.file_name = file_name.into();
        task.content_type = content_type.clone();
        task.size_bytes = size_bytes;
        task.status = UploadStatus::Validating;
        self.replace(task.clone());

        if content_type == ACCEPTED_CONTENT_TYPE {
            task.status = UploadStatus::Ready;
        } else {
            tracing::debug!(%content_type, "rejected file selection");
            task.status = UploadStatus::Failed;
            task.error_message = Some("Only PNG images are allowed".to_string());
        }
        self.replace(task.clone());
        task
    }

    /// Uploads the current `Ready` file.
    ///
    /// Walks `Ready → RequestingUrl → Uploading → Succeeded`, dropping into
    /// `Failed` with the failing step's message on any error. If the user
    /// selects another file while this call is in flight, the remaining
    /// completions are discarded and the call returns `Ok(())` without
    /// touching the new task.
    pub async fn start_upload(&self, bytes: Vec<u8>) -> Result<()> {
        let generation = {
            let task = self.task.read().unwrap();
            if task.status != UploadStatus::Ready {
                return Err(SnapError::validation("No file is ready for upload"));
            }
            task.generation
        };

        self.apply_if_current(generation, |task| {
            task.status = UploadStatus::RequestingUrl;
        });

        let slot = match self.backend.request_upload_slot().await {
            Ok(slot) => slot,
            Err(err) => return self.fail_or_discard(generation, err),
        };

        let still_current = self.apply_if_current(generation, |task| {
            task.remote_key = Some(slot.remote_key.clone());
            task.status = UploadStatus::Uploading;
        });
        if !still_current {
            return Ok(());
        }

        let progress_manager = self.clone();
        let on_progress: ProgressFn = Box::new(move |percent| {
            progress_manager.apply_if_current(generation, |task| {
                task.progress_percent = percent.min(100);
            });
        });

        match self.backend.transfer(&slot, bytes, on_progress).await {
            Ok(()) => {
                self.apply_if_current(generation, |task| {
                    task.status = UploadStatus::Succeeded;
                    task.progress_percent = 100;
                });
                tracing::info!(remote_key = %slot.remote_key, "upload completed");
                Ok(())
            }
            Err(err) => self.fail_or_discard(generation, err),
        }
    }

    /// Resets to a fresh idle task, abandoning anything in flight.
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.replace(UploadTask::idle(generation));
    }

    /// A point-in-time copy of the active task.
    pub fn snapshot(&self) -> UploadTask {
        self.task.read().unwrap().clone()
    }

    /// Subscribes to task changes.
    pub fn subscribe(&self) -> watch::Receiver<UploadTask> {
        self.notifier.subscribe()
    }

    fn replace(&self, task: UploadTask) {
        *self.task.write().unwrap() = task.clone();
        let _ = self.notifier.send(task);
    }

    /// Applies `mutate` to the task only if it still belongs to `generation`.
    ///
    /// Returns false when the completion is stale and was discarded.
    fn apply_if_current<F>(&self, generation: u64, mutate: F) -> bool
    where
        F: FnOnce(&mut UploadTask),
    {
        let mut task = self.task.write().unwrap();
        if task.generation != generation {
            tracing::debug!(
                stale = generation,
                current = task.generation,
                "discarded stale upload completion"
            );
            return false;
        }
        mutate(&mut task);
        let _ = self.notifier.send(task.clone());
        true
    }

    /// Records a failure on the owning task, or swallows it when stale.
    fn fail_or_discard(&self, generation: u64, err: SnapError) -> Result<()> {
        let message = err.user_message();
        if self.apply_if_current(generation, |task| {
            task.status = UploadStatus::Failed;
            task.error_message = Some(message.clone());
        }) {
            Err(err)
        } else {
            Ok(())
        }
    }
}
