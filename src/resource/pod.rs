//! Pod schema (core/v1) restricted to identity and status
//!
//! Field order in every projection follows the `v1.PodStatus` declaration order so
//! that diff output is stable for a given schema version.

use super::WatchedResource;
use crate::record::{Project, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub uid: Option<String>,
    pub resource_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub status: PodStatus,
}

impl WatchedResource for Pod {
    const KIND: &'static str = "Pod";

    type Status = PodStatus;

    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    fn status(&self) -> &PodStatus {
        &self.status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodStatus {
    pub phase: Option<String>,
    pub conditions: Vec<PodCondition>,
    pub message: Option<String>,
    pub reason: Option<String>,
    pub nominated_node_name: Option<String>,
    #[serde(rename = "hostIP")]
    pub host_ip: Option<String>,
    #[serde(rename = "podIP")]
    pub pod_ip: Option<String>,
    #[serde(rename = "podIPs")]
    pub pod_ips: Vec<PodIp>,
    pub start_time: Option<String>,
    pub init_container_statuses: Vec<ContainerStatus>,
    pub container_statuses: Vec<ContainerStatus>,
    pub qos_class: Option<String>,
    pub ephemeral_container_statuses: Vec<ContainerStatus>,
}

impl Project for PodStatus {
    const KIND: &'static str = "PodStatus";

    fn project(&self) -> Record {
        Record::structure()
            .field("Phase", &self.phase)
            .field("Conditions", &self.conditions)
            .field("Message", &self.message)
            .field("Reason", &self.reason)
            .field("NominatedNodeName", &self.nominated_node_name)
            .field("HostIP", &self.host_ip)
            .field("PodIP", &self.pod_ip)
            .field("PodIPs", &self.pod_ips)
            .field("StartTime", &self.start_time)
            .field("InitContainerStatuses", &self.init_container_statuses)
            .field("ContainerStatuses", &self.container_statuses)
            .field("QOSClass", &self.qos_class)
            .field("EphemeralContainerStatuses", &self.ephemeral_container_statuses)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    pub last_probe_time: Option<String>,
    pub last_transition_time: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl Project for PodCondition {
    const KIND: &'static str = "PodCondition";

    fn project(&self) -> Record {
        Record::structure()
            .field("Type", &self.condition_type)
            .field("Status", &self.status)
            .field("LastProbeTime", &self.last_probe_time)
            .field("LastTransitionTime", &self.last_transition_time)
            .field("Reason", &self.reason)
            .field("Message", &self.message)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodIp {
    pub ip: String,
}

impl Project for PodIp {
    const KIND: &'static str = "PodIP";

    fn project(&self) -> Record {
        Record::structure().field("IP", &self.ip).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStatus {
    pub name: String,
    pub state: Option<ContainerState>,
    pub last_state: Option<ContainerState>,
    pub ready: bool,
    pub restart_count: i32,
    pub image: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    #[serde(rename = "containerID")]
    pub container_id: Option<String>,
    pub started: Option<bool>,
}

impl Project for ContainerStatus {
    const KIND: &'static str = "ContainerStatus";

    fn project(&self) -> Record {
        Record::structure()
            .field("Name", &self.name)
            .field("State", &self.state)
            .field("LastTerminationState", &self.last_state)
            .field("Ready", &self.ready)
            .field("RestartCount", &self.restart_count)
            .field("Image", &self.image)
            .field("ImageID", &self.image_id)
            .field("ContainerID", &self.container_id)
            .field("Started", &self.started)
            .finish()
    }
}

/// At most one member is set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerState {
    pub waiting: Option<ContainerStateWaiting>,
    pub running: Option<ContainerStateRunning>,
    pub terminated: Option<ContainerStateTerminated>,
}

impl Project for ContainerState {
    const KIND: &'static str = "ContainerState";

    fn project(&self) -> Record {
        Record::structure()
            .field("Waiting", &self.waiting)
            .field("Running", &self.running)
            .field("Terminated", &self.terminated)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerStateWaiting {
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl Project for ContainerStateWaiting {
    const KIND: &'static str = "ContainerStateWaiting";

    fn project(&self) -> Record {
        Record::structure()
            .field("Reason", &self.reason)
            .field("Message", &self.message)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStateRunning {
    pub started_at: Option<String>,
}

impl Project for ContainerStateRunning {
    const KIND: &'static str = "ContainerStateRunning";

    fn project(&self) -> Record {
        Record::structure()
            .field("StartedAt", &self.started_at)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStateTerminated {
    pub exit_code: i32,
    pub signal: Option<i32>,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    #[serde(rename = "containerID")]
    pub container_id: Option<String>,
}

impl Project for ContainerStateTerminated {
    const KIND: &'static str = "ContainerStateTerminated";

    fn project(&self) -> Record {
        Record::structure()
            .field("ExitCode", &self.exit_code)
            .field("Signal", &self.signal)
            .field("Reason", &self.reason)
            .field("Message", &self.message)
            .field("StartedAt", &self.started_at)
            .field("FinishedAt", &self.finished_at)
            .field("ContainerID", &self.container_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_deserialize_pod_from_api_json() {
        // Arrange
        let json = serde_json::json!({
            "kind": "Pod",
            "metadata": {
                "name": "web-1",
                "namespace": "default",
                "uid": "a1b2",
                "resourceVersion": "42"
            },
            "spec": { "containers": [] },
            "status": {
                "phase": "Running",
                "hostIP": "10.0.0.1",
                "podIPs": [{ "ip": "172.17.0.4" }],
                "qosClass": "BestEffort",
                "containerStatuses": [{
                    "name": "nginx",
                    "state": { "running": { "startedAt": "2024-05-01T10:00:00Z" } },
                    "lastState": {},
                    "ready": true,
                    "restartCount": 1,
                    "image": "nginx:1.25",
                    "imageID": "docker-pullable://nginx@sha256:abc",
                    "containerID": "containerd://123",
                    "started": true
                }]
            }
        });

        // Act
        let pod: Pod = serde_json::from_value(json).expect("Failed to deserialize");

        // Assert
        assert_eq!(pod.name(), "web-1");
        assert_eq!(pod.namespace(), "default");
        assert_eq!(pod.key(), "default/web-1");
        assert_eq!(pod.status.phase.as_deref(), Some("Running"));
        assert_eq!(pod.status.host_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(pod.status.qos_class.as_deref(), Some("BestEffort"));
        assert_eq!(pod.status.pod_ips[0].ip, "172.17.0.4");
        let container = &pod.status.container_statuses[0];
        assert_eq!(container.image_id, "docker-pullable://nginx@sha256:abc");
        assert_eq!(container.restart_count, 1);
        assert_eq!(
            container
                .state
                .as_ref()
                .and_then(|s| s.running.as_ref())
                .and_then(|r| r.started_at.as_deref()),
            Some("2024-05-01T10:00:00Z")
        );
    }

    #[test]
    fn should_project_status_fields_in_schema_order() {
        // Arrange
        let status = PodStatus::default();

        // Act
        let record = status.project();

        // Assert
        let Record::Struct(fields) = record else {
            panic!("expected struct");
        };
        let names: Vec<_> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "Phase",
                "Conditions",
                "Message",
                "Reason",
                "NominatedNodeName",
                "HostIP",
                "PodIP",
                "PodIPs",
                "StartTime",
                "InitContainerStatuses",
                "ContainerStatuses",
                "QOSClass",
                "EphemeralContainerStatuses",
            ]
        );
    }

    #[test]
    fn should_project_same_shape_for_running_and_waiting_containers() {
        // Arrange
        let waiting = ContainerStatus {
            name: "app".to_string(),
            state: Some(ContainerState {
                waiting: Some(ContainerStateWaiting {
                    reason: Some("ContainerCreating".to_string()),
                    message: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let running = ContainerStatus {
            name: "app".to_string(),
            state: Some(ContainerState {
                running: Some(ContainerStateRunning {
                    started_at: Some("2024-05-01T10:00:00Z".to_string()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        // Act
        let a = waiting.project();
        let b = running.project();

        // Assert
        assert_eq!(a.blanked(), b.blanked());
        assert_ne!(a, b);
    }
}
