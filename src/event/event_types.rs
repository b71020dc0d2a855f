//! Change event structure

use crate::resource::WatchedResource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle transition of a watched object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "added" => Ok(ChangeKind::Added),
            "deleted" => Ok(ChangeKind::Deleted),
            "modified" => Ok(ChangeKind::Modified),
            _ => Err("invalid change kind: expected 'added', 'deleted', or 'modified'"),
        }
    }
}

/// One event from the source, carrying full object snapshots.
///
/// `Added` carries the new snapshot, `Deleted` the last known one, `Modified` both.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<R> {
    Added(R),
    Deleted(R),
    Modified { old: R, new: R },
}

impl<R: WatchedResource> ChangeEvent<R> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Added(_) => ChangeKind::Added,
            ChangeEvent::Deleted(_) => ChangeKind::Deleted,
            ChangeEvent::Modified { .. } => ChangeKind::Modified,
        }
    }

    /// Snapshot that identifies the object (the newest one available)
    pub fn object(&self) -> &R {
        match self {
            ChangeEvent::Added(obj) | ChangeEvent::Deleted(obj) => obj,
            ChangeEvent::Modified { new, .. } => new,
        }
    }

    pub fn name(&self) -> &str {
        self.object().name()
    }

    pub fn namespace(&self) -> &str {
        self.object().namespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn should_expose_kind_and_identity() {
        // Arrange
        let added = ChangeEvent::Added(pod("web-1", "default", "Pending"));
        let deleted = ChangeEvent::Deleted(pod("job-7", "batch", "Succeeded"));
        let modified = ChangeEvent::Modified {
            old: pod("api", "prod", "Pending"),
            new: pod("api", "prod", "Running"),
        };

        // Act & Assert
        assert_eq!(added.kind(), ChangeKind::Added);
        assert_eq!(added.name(), "web-1");
        assert_eq!(added.namespace(), "default");
        assert_eq!(deleted.kind(), ChangeKind::Deleted);
        assert_eq!(deleted.namespace(), "batch");
        assert_eq!(modified.kind(), ChangeKind::Modified);
        assert_eq!(
            modified.object().status.phase.as_deref(),
            Some("Running")
        );
    }

    #[test]
    fn should_parse_change_kind_from_string() {
        assert_eq!(ChangeKind::from_str("added"), Ok(ChangeKind::Added));
        assert_eq!(ChangeKind::from_str(" MODIFIED "), Ok(ChangeKind::Modified));
        assert_eq!(ChangeKind::from_str("Deleted"), Ok(ChangeKind::Deleted));
        assert!(ChangeKind::from_str("bookmark").is_err());
    }
}
