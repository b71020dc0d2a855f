//! Known, versioned object schemas the watcher understands

pub mod pod;

pub use pod::{
    ContainerState, ContainerStateRunning, ContainerStateTerminated, ContainerStateWaiting,
    ContainerStatus, ObjectMeta, Pod, PodCondition, PodIp, PodStatus,
};

use crate::record::{Project, Record};
use serde::de::DeserializeOwned;

/// A cluster object kind whose status can be diffed
pub trait WatchedResource: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Kind label used in notification messages (e.g. `Pod`)
    const KIND: &'static str;

    type Status: Project;

    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    fn status(&self) -> &Self::Status;

    /// Cache key, `<namespace>/<name>`
    fn key(&self) -> String {
        format!("{}/{}", self.namespace(), self.name())
    }

    fn status_record(&self) -> Record {
        self.status().project()
    }
}
