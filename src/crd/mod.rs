//! Custom Resource Definitions for the Snapshot Mirror Operator

mod snapshot_backup;
mod volume_snapshot_content;

pub use snapshot_backup::*;
pub use volume_snapshot_content::*;

use kube::CustomResourceExt;

/// Generate CRD YAML manifests owned by this operator
///
/// VolumeSnapshotContent is deliberately absent: that CRD belongs to the CSI
/// external-snapshotter and must already be installed in the cluster.
pub fn generate_crds() -> Vec<String> {
    vec![serde_yaml::to_string(&SnapshotBackup::crd()).unwrap()]
}
