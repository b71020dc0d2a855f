//! Watch filtering applied before dispatch

use crate::event::{ChangeEvent, ChangeKind};
use crate::resource::WatchedResource;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, warn};

/// Which change events reach the dispatcher
#[derive(Debug, Clone)]
pub struct WatchFilter {
    /// Watched namespaces (empty = all)
    namespaces: HashSet<String>,
    /// Ignored namespaces (blacklist)
    ignored_namespaces: HashSet<String>,
    /// Enabled change kinds (empty = all)
    enabled_kinds: HashSet<ChangeKind>,
    /// `false` lets every event through
    active: bool,
}

impl Default for WatchFilter {
    fn default() -> Self {
        Self {
            namespaces: HashSet::new(),
            ignored_namespaces: HashSet::new(),
            enabled_kinds: HashSet::new(),
            active: true,
        }
    }
}

impl WatchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter that accepts all events
    pub fn allow_all() -> Self {
        Self {
            active: false,
            ..Self::default()
        }
    }

    pub fn with_namespaces(mut self, namespaces: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.namespaces = namespaces.into_iter().map(|n| n.into()).collect();
        self
    }

    pub fn ignore_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.ignored_namespaces.insert(namespace.into());
        self
    }

    pub fn with_enabled_kinds(mut self, kinds: impl IntoIterator<Item = ChangeKind>) -> Self {
        self.enabled_kinds = kinds.into_iter().collect();
        self
    }

    /// Check if an event should be dispatched
    pub fn accepts<R: WatchedResource>(&self, event: &ChangeEvent<R>) -> bool {
        if !self.active {
            return true;
        }

        let kind = event.kind();
        if !self.enabled_kinds.is_empty() && !self.enabled_kinds.contains(&kind) {
            debug!(kind = %kind, "Change kind not enabled, skipping");
            return false;
        }

        let namespace = event.namespace();
        if !self.namespaces.is_empty() && !self.namespaces.contains(namespace) {
            debug!(namespace = %namespace, "Namespace not watched, skipping");
            return false;
        }

        if self.ignored_namespaces.contains(namespace) {
            debug!(namespace = %namespace, "Namespace ignored, skipping");
            return false;
        }

        true
    }

    pub fn namespaces(&self) -> &HashSet<String> {
        &self.namespaces
    }

    pub fn ignored_namespaces(&self) -> &HashSet<String> {
        &self.ignored_namespaces
    }

    pub fn enabled_kinds(&self) -> &HashSet<ChangeKind> {
        &self.enabled_kinds
    }
}

/// Builds a [`WatchFilter`] from environment-style variables
pub struct WatchFilterBuilder {
    filter: WatchFilter,
}

impl WatchFilterBuilder {
    pub fn new() -> Self {
        Self {
            filter: WatchFilter::new(),
        }
    }

    /// Load from any key lookup
    ///
    /// - `WATCH_NAMESPACES` (comma-separated)
    /// - `WATCH_IGNORED_NAMESPACES` (comma-separated)
    /// - `WATCH_EVENTS` (comma-separated: added, deleted, modified)
    pub fn load_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespaces) = lookup("WATCH_NAMESPACES") {
            self.filter.namespaces = split_list(&namespaces).collect();
        }

        if let Some(namespaces) = lookup("WATCH_IGNORED_NAMESPACES") {
            self.filter.ignored_namespaces = split_list(&namespaces).collect();
        }

        if let Some(kinds) = lookup("WATCH_EVENTS") {
            self.filter.enabled_kinds = split_list(&kinds)
                .filter_map(|k| match ChangeKind::from_str(&k) {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        warn!(value = %k, "Ignoring WATCH_EVENTS entry: {}", e);
                        None
                    }
                })
                .collect();
        }

        self
    }

    pub fn build(self) -> WatchFilter {
        self.filter
    }
}

impl Default for WatchFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ObjectMeta, Pod};
    use std::collections::HashMap;

    fn added(namespace: &str) -> ChangeEvent<Pod> {
        ChangeEvent::Added(Pod {
            metadata: ObjectMeta {
                name: "web-1".to_string(),
                namespace: namespace.to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn modified(namespace: &str) -> ChangeEvent<Pod> {
        let ChangeEvent::Added(pod) = added(namespace) else {
            unreachable!()
        };
        ChangeEvent::Modified {
            old: pod.clone(),
            new: pod,
        }
    }

    #[test]
    fn should_accept_everything_when_inactive() {
        // Arrange
        let filter = WatchFilter::allow_all().with_namespaces(vec!["prod"]);

        // Act & Assert
        assert!(filter.accepts(&added("default")));
    }

    #[test]
    fn should_accept_all_namespaces_when_whitelist_empty() {
        let filter = WatchFilter::new();

        assert!(filter.accepts(&added("default")));
        assert!(filter.accepts(&added("kube-system")));
    }

    #[test]
    fn should_filter_by_namespace_whitelist() {
        // Arrange
        let filter = WatchFilter::new().with_namespaces(vec!["prod", "staging"]);

        // Act & Assert
        assert!(filter.accepts(&added("prod")));
        assert!(!filter.accepts(&added("default")));
    }

    #[test]
    fn should_filter_ignored_namespaces() {
        // Arrange
        let filter = WatchFilter::new().ignore_namespace("kube-system");

        // Act & Assert
        assert!(!filter.accepts(&added("kube-system")));
        assert!(filter.accepts(&added("default")));
    }

    #[test]
    fn should_filter_by_change_kind() {
        // Arrange
        let filter = WatchFilter::new().with_enabled_kinds(vec![ChangeKind::Modified]);

        // Act & Assert
        assert!(!filter.accepts(&added("default")));
        assert!(filter.accepts(&modified("default")));
    }

    #[test]
    fn should_load_filter_from_lookup() {
        // Arrange
        let vars: HashMap<&str, &str> = HashMap::from([
            ("WATCH_NAMESPACES", "prod, staging,"),
            ("WATCH_IGNORED_NAMESPACES", "kube-system"),
            ("WATCH_EVENTS", "added,modified,bogus"),
        ]);

        // Act
        let filter = WatchFilterBuilder::new()
            .load_from(|k| vars.get(k).map(|v| v.to_string()))
            .build();

        // Assert
        assert!(!filter.accepts(&added("default")));
        assert!(filter.accepts(&modified("prod")));
        assert_eq!(filter.namespaces().len(), 2);
        assert!(filter.namespaces().contains("staging"));
        assert!(filter.ignored_namespaces().contains("kube-system"));
        assert_eq!(filter.enabled_kinds().len(), 2);
        assert!(!filter.enabled_kinds().contains(&ChangeKind::Deleted));
    }
}
