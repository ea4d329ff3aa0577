//! VolumeSnapshotContent resource types
//!
//! These mirror the `snapshot.storage.k8s.io/v1` VolumeSnapshotContent CRD
//! shipped by the CSI external-snapshotter. The operator never installs this
//! CRD, it only reads existing contents and writes clones, so only the fields
//! the mirror path touches are modeled here.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// VolumeSnapshotContent resource specification
///
/// Cluster-scoped. The spec is owned by the snapshot subsystem; the status
/// (in particular `snapshotHandle`) is populated by the storage driver.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "snapshot.storage.k8s.io",
    version = "v1",
    kind = "VolumeSnapshotContent",
    plural = "volumesnapshotcontents",
    singular = "volumesnapshotcontent",
    status = "VolumeSnapshotContentStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSpec {
    /// What happens to the backend snapshot when the content is deleted
    /// (Delete or Retain)
    pub deletion_policy: String,

    /// CSI driver servicing this snapshot
    pub driver: String,

    /// The VolumeSnapshot object this content is bound to
    pub volume_snapshot_ref: VolumeSnapshotRef,

    /// Where the backend snapshot comes from
    pub source: VolumeSnapshotContentSource,

    /// VolumeSnapshotClass used to create the snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,
}

/// Reference to the namespaced VolumeSnapshot that requested this content
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotRef {
    /// API version of the referent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Kind of the referent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Namespace of the referent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Name of the referent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// UID of the referent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Source of the backend snapshot
///
/// Exactly one of `volume_handle` (dynamic provisioning) or `snapshot_handle`
/// (pre-existing snapshot) is set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSource {
    /// Handle of the volume to snapshot (dynamic provisioning)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_handle: Option<String>,

    /// Handle of an already-existing backend snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_handle: Option<String>,
}

/// VolumeSnapshotContent status, written by the storage driver
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentStatus {
    /// Opaque backend snapshot handle assigned by the driver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_handle: Option<String>,

    /// Whether the snapshot is ready for restore
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_to_use: Option<bool>,

    /// Size of the snapshot in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_size: Option<i64>,
}
