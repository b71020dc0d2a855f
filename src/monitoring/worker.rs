//! Bounded notify queue with a single consumer
//!
//! The worker task is the only owner of the [`Notifier`], so the transport is
//! never used from two tasks at once. Producers wait for queue capacity, never
//! for delivery.

use crate::monitoring::retry::with_retry;
use crate::monitoring::{Notification, Notifier, RetryPolicy};
use crate::utils::AppError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

/// Default bounded queue size
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Producer side of the notify queue
#[derive(Debug, Clone)]
pub struct NotifyHandle {
    sender: mpsc::Sender<Notification>,
}

impl NotifyHandle {
    /// Queue a notification, waiting for capacity if the queue is full.
    ///
    /// # Errors
    ///
    /// `QueueClosed` if the worker has stopped.
    pub async fn enqueue(&self, notification: Notification) -> Result<(), AppError> {
        self.sender.send(notification).await.map_err(|e| {
            AppError::QueueClosed(format!("notification {} not queued", e.0.id))
        })
    }
}

/// Bounded queue pair; `capacity` must be non-zero
pub fn notify_channel(capacity: usize) -> (NotifyHandle, mpsc::Receiver<Notification>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (NotifyHandle { sender }, receiver)
}

/// Delivery counters reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Consumer that owns the notifier
pub struct NotifyWorker {
    notifier: Box<dyn Notifier>,
    receiver: mpsc::Receiver<Notification>,
    retry: RetryPolicy,
}

impl NotifyWorker {
    pub fn new(
        notifier: Box<dyn Notifier>,
        receiver: mpsc::Receiver<Notification>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            notifier,
            receiver,
            retry,
        }
    }

    /// Deliver queued notifications until every handle is dropped and the queue
    /// is drained. Failures are logged and counted, never propagated.
    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();

        info!(
            destination = %self.notifier.destination(),
            "Starting notify worker"
        );

        while let Some(notification) = self.receiver.recv().await {
            match self.deliver(&notification).await {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!(
                        notification_id = %notification.id,
                        object = %notification.object,
                        error_code = e.error_code(),
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }

        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "Notify queue closed, worker stopped"
        );
        stats
    }

    #[instrument(skip(self, notification), fields(notification_id = %notification.id, kind = %notification.kind))]
    async fn deliver(&self, notification: &Notification) -> Result<(), AppError> {
        let notifier = self.notifier.as_ref();
        with_retry(&self.retry, move || notifier.send(notification)).await?;
        debug!(object = %notification.object, "Notification delivered");
        Ok(())
    }
}

/// Spawn the worker on the tokio runtime and return the producer handle
pub fn spawn_notify_worker(
    notifier: Box<dyn Notifier>,
    capacity: usize,
    retry: RetryPolicy,
) -> (NotifyHandle, JoinHandle<WorkerStats>) {
    let (handle, receiver) = notify_channel(capacity);
    let worker = NotifyWorker::new(notifier, receiver, retry);
    (handle, tokio::spawn(worker.run()))
}

/// Wait for a spawned worker to finish draining the queue.
///
/// # Errors
///
/// `InternalError` if the worker task panicked or was cancelled.
pub async fn join_notify_worker(worker: JoinHandle<WorkerStats>) -> Result<WorkerStats, AppError> {
    worker
        .await
        .map_err(|e| AppError::internal_error(format!("notify worker stopped abnormally: {}", e)))
}
