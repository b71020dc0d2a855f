//! Change-event dispatcher
//!
//! Maps each change event to a notification:
//! - Added -> creation message
//! - Deleted -> deletion message
//! - Modified -> status diff; nothing is sent when the diff is empty
//!
//! Projection, diff and rendering run on the caller's task. Only the finished
//! message is handed to the notify queue.

use crate::diff::{diff_status, render};
use crate::event::{ChangeEvent, EventSource, WatchFilter};
use crate::monitoring::{Notification, NotifyHandle};
use crate::resource::WatchedResource;
use crate::utils::AppError;
use std::marker::PhantomData;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Message handed to the notify queue
    Queued,
    /// Modified event without observable status change
    Suppressed,
    /// Rejected by the watch filter
    Filtered,
    /// Dropped after an error (schema mismatch, queue closed)
    Dropped,
}

/// Outcome counters for a dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub queued: usize,
    pub suppressed: usize,
    pub filtered: usize,
    pub dropped: usize,
}

impl DispatchStats {
    pub fn record(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Queued => self.queued += 1,
            DispatchOutcome::Suppressed => self.suppressed += 1,
            DispatchOutcome::Filtered => self.filtered += 1,
            DispatchOutcome::Dropped => self.dropped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.queued + self.suppressed + self.filtered + self.dropped
    }
}

pub fn created_message<R: WatchedResource>(obj: &R) -> String {
    format!(
        "{} created: *{}* in namespace {}",
        R::KIND,
        obj.name(),
        obj.namespace()
    )
}

pub fn deleted_message<R: WatchedResource>(obj: &R) -> String {
    format!(
        "{} deleted: *{}* in namespace {}",
        R::KIND,
        obj.name(),
        obj.namespace()
    )
}

pub fn changed_message<R: WatchedResource>(obj: &R, rendered_diff: &str) -> String {
    format!(
        "{} changed status: *{}* in namespace {} :\n{}",
        R::KIND,
        obj.name(),
        obj.namespace(),
        rendered_diff
    )
}

/// Stateless dispatcher; holds no per-object memory
pub struct Dispatcher<R> {
    notify: NotifyHandle,
    filter: WatchFilter,
    _resource: PhantomData<fn() -> R>,
}

impl<R: WatchedResource> Dispatcher<R> {
    pub fn new(notify: NotifyHandle, filter: WatchFilter) -> Self {
        Self {
            notify,
            filter,
            _resource: PhantomData,
        }
    }

    /// Build the notification for an event, if one is due.
    ///
    /// Returns `Ok(None)` for a Modified event whose status diff is empty.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` when the old and new status records disagree in shape.
    pub fn compose(&self, event: &ChangeEvent<R>) -> Result<Option<Notification>, AppError> {
        let object = event.object().key();

        let message = match event {
            ChangeEvent::Added(obj) => created_message(obj),
            ChangeEvent::Deleted(obj) => deleted_message(obj),
            ChangeEvent::Modified { old, new } => {
                let result = diff_status(old, new)?;
                if result.is_empty() {
                    return Ok(None);
                }
                debug!(object = %object, changes = result.len(), "Status diff computed");
                changed_message(new, &render(&result))
            }
        };

        Ok(Some(Notification::new(event.kind(), object, message)))
    }

    /// Handle one event. Never fails: errors are logged and the event dropped.
    #[instrument(skip(self, event), fields(kind = %event.kind(), object = %event.object().key()))]
    pub async fn dispatch(&self, event: ChangeEvent<R>) -> DispatchOutcome {
        if !self.filter.accepts(&event) {
            debug!("Event rejected by watch filter");
            return DispatchOutcome::Filtered;
        }

        let notification = match self.compose(&event) {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                debug!("Status unchanged, notification suppressed");
                return DispatchOutcome::Suppressed;
            }
            Err(e) => {
                warn!(
                    error_code = e.error_code(),
                    error = %e,
                    "Dropping event with unexpected status schema"
                );
                return DispatchOutcome::Dropped;
            }
        };

        let notification_id = notification.id;
        match self.notify.enqueue(notification).await {
            Ok(()) => {
                debug!(notification_id = %notification_id, "Notification queued");
                DispatchOutcome::Queued
            }
            Err(e) => {
                error!(error_code = e.error_code(), error = %e, "Failed to queue notification");
                DispatchOutcome::Dropped
            }
        }
    }

    /// Dispatch every event from `source`, in delivery order, until it ends
    pub async fn run<S>(&self, source: &mut S) -> DispatchStats
    where
        S: EventSource<R> + ?Sized,
    {
        info!(kind = R::KIND, "Starting dispatcher loop");

        let mut stats = DispatchStats::default();
        while let Some(event) = source.next_event().await {
            stats.record(self.dispatch(event).await);
        }

        info!(
            queued = stats.queued,
            suppressed = stats.suppressed,
            filtered = stats.filtered,
            dropped = stats.dropped,
            "Event source ended"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeKind;
    use crate::monitoring::notify_channel;
    use crate::resource::{ObjectMeta, Pod};

    fn pod(name: &str, namespace: &str, phase: &str) -> Pod {
        let mut pod = Pod {
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: namespace.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        pod.status.phase = Some(phase.to_string());
        pod
    }

    fn dispatcher() -> (Dispatcher<Pod>, tokio::sync::mpsc::Receiver<Notification>) {
        let (handle, receiver) = notify_channel(8);
        (Dispatcher::new(handle, WatchFilter::allow_all()), receiver)
    }

    #[test]
    fn should_compose_created_message() {
        // Arrange
        let (dispatcher, _rx) = dispatcher();
        let event = ChangeEvent::Added(pod("web-1", "default", "Pending"));

        // Act
        let notification = dispatcher.compose(&event).unwrap().expect("notification");

        // Assert
        assert_eq!(notification.message, "Pod created: *web-1* in namespace default");
        assert_eq!(notification.kind, ChangeKind::Added);
        assert_eq!(notification.object, "default/web-1");
    }

    #[test]
    fn should_compose_deleted_message() {
        let (dispatcher, _rx) = dispatcher();
        let event = ChangeEvent::Deleted(pod("job-7", "batch", "Succeeded"));

        let notification = dispatcher.compose(&event).unwrap().expect("notification");

        assert_eq!(notification.message, "Pod deleted: *job-7* in namespace batch");
    }

    #[test]
    fn should_compose_changed_message_with_diff() {
        // Arrange
        let (dispatcher, _rx) = dispatcher();
        let event = ChangeEvent::Modified {
            old: pod("web-1", "default", "Pending"),
            new: pod("web-1", "default", "Running"),
        };

        // Act
        let notification = dispatcher.compose(&event).unwrap().expect("notification");

        // Assert
        assert_eq!(
            notification.message,
            "Pod changed status: *web-1* in namespace default :\n*Phase*\n-Pending\n+Running"
        );
    }

    #[test]
    fn should_compose_nothing_for_unchanged_status() {
        let (dispatcher, _rx) = dispatcher();
        let snapshot = pod("web-1", "default", "Running");
        let event = ChangeEvent::Modified {
            old: snapshot.clone(),
            new: snapshot,
        };

        assert!(dispatcher.compose(&event).unwrap().is_none());
    }

    #[tokio::test]
    async fn should_queue_notification_for_added_event() {
        // Arrange
        let (dispatcher, mut rx) = dispatcher();

        // Act
        let outcome = dispatcher
            .dispatch(ChangeEvent::Added(pod("web-1", "default", "Pending")))
            .await;

        // Assert
        assert_eq!(outcome, DispatchOutcome::Queued);
        let queued = rx.try_recv().expect("nothing queued");
        assert_eq!(queued.message, "Pod created: *web-1* in namespace default");
    }

    #[tokio::test]
    async fn should_suppress_unchanged_modified_event() {
        // Arrange
        let (dispatcher, mut rx) = dispatcher();
        let snapshot = pod("web-1", "default", "Running");

        // Act
        let outcome = dispatcher
            .dispatch(ChangeEvent::Modified {
                old: snapshot.clone(),
                new: snapshot,
            })
            .await;

        // Assert
        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_skip_filtered_event() {
        // Arrange
        let (handle, mut rx) = notify_channel(8);
        let filter = WatchFilter::new().ignore_namespace("kube-system");
        let dispatcher: Dispatcher<Pod> = Dispatcher::new(handle, filter);

        // Act
        let outcome = dispatcher
            .dispatch(ChangeEvent::Added(pod("coredns", "kube-system", "Running")))
            .await;

        // Assert
        assert_eq!(outcome, DispatchOutcome::Filtered);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_drop_event_when_queue_closed() {
        // Arrange
        let (dispatcher, rx) = dispatcher();
        drop(rx);

        // Act
        let outcome = dispatcher
            .dispatch(ChangeEvent::Deleted(pod("job-7", "batch", "Succeeded")))
            .await;

        // Assert
        assert_eq!(outcome, DispatchOutcome::Dropped);
    }

    #[test]
    fn should_count_outcomes() {
        let mut stats = DispatchStats::default();

        stats.record(DispatchOutcome::Queued);
        stats.record(DispatchOutcome::Queued);
        stats.record(DispatchOutcome::Suppressed);
        stats.record(DispatchOutcome::Dropped);

        assert_eq!(
            stats,
            DispatchStats {
                queued: 2,
                suppressed: 1,
                filtered: 0,
                dropped: 1
            }
        );
        assert_eq!(stats.total(), 4);
    }
}
