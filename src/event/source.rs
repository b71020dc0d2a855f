//! Event source abstraction

use crate::event::ChangeEvent;
use crate::resource::WatchedResource;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Producer of change events, ordered per object.
///
/// `None` means the stream has ended.
#[async_trait]
pub trait EventSource<R: WatchedResource>: Send {
    async fn next_event(&mut self) -> Option<ChangeEvent<R>>;
}

/// Source fed through a tokio channel
pub struct ChannelSource<R> {
    receiver: mpsc::Receiver<ChangeEvent<R>>,
}

impl<R: WatchedResource> ChannelSource<R> {
    pub fn new(receiver: mpsc::Receiver<ChangeEvent<R>>) -> Self {
        Self { receiver }
    }

    /// Channel pair with the given capacity
    pub fn channel(capacity: usize) -> (mpsc::Sender<ChangeEvent<R>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl<R: WatchedResource> EventSource<R> for ChannelSource<R> {
    async fn next_event(&mut self) -> Option<ChangeEvent<R>> {
        self.receiver.recv().await
    }
}
