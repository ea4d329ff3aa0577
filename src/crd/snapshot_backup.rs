//! SnapshotBackup Custom Resource Definition

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SnapshotBackup resource specification
///
/// A SnapshotBackup names an existing VolumeSnapshotContent and asks the
/// operator to mirror it into a clone that can be consumed independently of
/// the original. The clone is owned by the SnapshotBackup, so deleting the
/// SnapshotBackup cascades to the clone.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "datamover.oso.sh",
    version = "v1alpha1",
    kind = "SnapshotBackup",
    plural = "snapshotbackups",
    singular = "snapshotbackup",
    shortname = "smb",
    namespaced,
    status = "SnapshotBackupStatus",
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Mirrored Content", "type": "string", "jsonPath": ".status.mirroredContentName"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBackupSpec {
    /// Reference to the source VolumeSnapshotContent to mirror
    pub volume_snapshot_content: VolumeSnapshotContentRef,
}

/// Reference to a cluster-scoped VolumeSnapshotContent by name
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentRef {
    /// Name of the VolumeSnapshotContent resource
    pub name: String,
}

/// SnapshotBackup status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBackupStatus {
    /// Current phase (Completed, Failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Name of the mirrored VolumeSnapshotContent clone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirrored_content_name: Option<String>,

    /// Timestamp of the last successful mirror
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_mirror_time: Option<DateTime<Utc>>,

    /// Observed generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Status conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Status condition
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type
    pub type_: String,

    /// Status (True, False, Unknown)
    pub status: String,

    /// Last transition time
    pub last_transition_time: DateTime<Utc>,

    /// Reason for the condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
