//! Object lifecycle events and where they come from
//!
//! - Change event definition
//! - Namespace / kind filtering
//! - Event source abstraction and a channel-backed source
//! - Kubernetes watch-stream decoder with an informer-style cache

pub mod filter;
pub mod source;
pub mod watch_stream;

mod event_types;

pub use event_types::{ChangeEvent, ChangeKind};
pub use filter::{WatchFilter, WatchFilterBuilder};
pub use source::{ChannelSource, EventSource};
pub use watch_stream::{decode_watch_line, WatchEvent, WatchEventType, WatchStreamSource};
