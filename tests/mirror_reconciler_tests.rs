//! Integration tests for the mirror reconciler logic
//!
//! These tests exercise the pure parts of the mirror path: validation, clone
//! naming, spec derivation, and owner reference handling. No cluster is
//! required.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use snapshot_mirror_operator::crd::{
    SnapshotBackup, SnapshotBackupSpec, VolumeSnapshotContent, VolumeSnapshotContentRef,
    VolumeSnapshotContentSource, VolumeSnapshotContentSpec, VolumeSnapshotContentStatus,
    VolumeSnapshotRef,
};
use snapshot_mirror_operator::error::Error;
use snapshot_mirror_operator::reconcilers::mirror::{
    apply_decision, clone_name, derive_clone_spec, desired_clone, require_source,
    set_controller_reference, snapshot_ref_name, validate, Operation, PROTECTED_NAMESPACE,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn source_content(name: &str) -> VolumeSnapshotContent {
    let mut content = VolumeSnapshotContent::new(
        name,
        VolumeSnapshotContentSpec {
            deletion_policy: "Delete".to_string(),
            driver: "csi.example.io".to_string(),
            volume_snapshot_ref: VolumeSnapshotRef {
                api_version: Some("v1".to_string()),
                kind: Some("VolumeSnapshot".to_string()),
                namespace: Some("app-namespace".to_string()),
                name: Some("app-snapshot".to_string()),
                uid: Some("11111111-aaaa-bbbb-cccc-222222222222".to_string()),
            },
            source: VolumeSnapshotContentSource {
                volume_handle: Some("vol-handle-9".to_string()),
                snapshot_handle: None,
            },
            volume_snapshot_class_name: Some("csi-snapclass".to_string()),
        },
    );
    content.status = Some(VolumeSnapshotContentStatus {
        snapshot_handle: Some("snap-handle-123".to_string()),
        ready_to_use: Some(true),
        restore_size: Some(1_073_741_824),
    });
    content
}

fn backup_for(source_name: &str) -> SnapshotBackup {
    SnapshotBackup {
        metadata: ObjectMeta {
            name: Some("test-backup".to_string()),
            namespace: Some("default".to_string()),
            uid: Some("33333333-dddd-eeee-ffff-444444444444".to_string()),
            ..Default::default()
        },
        spec: SnapshotBackupSpec {
            volume_snapshot_content: VolumeSnapshotContentRef {
                name: source_name.to_string(),
            },
        },
        status: None,
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn valid_backup_passes_validation() {
    let backup = backup_for("snap-a");
    assert!(validate(&backup).is_ok());
}

#[test]
fn empty_content_reference_fails_validation() {
    let backup = backup_for("");
    let result = validate(&backup);

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("volumeSnapshotContent.name"));
}

#[test]
fn whitespace_content_reference_fails_validation() {
    let backup = backup_for("   ");
    assert!(validate(&backup).is_err());
}

// ============================================================================
// Deterministic Naming Tests
// ============================================================================

#[test]
fn clone_name_is_deterministic() {
    assert_eq!(clone_name("snap-a"), "snap-a-clone");
    assert_eq!(clone_name("snap-a"), clone_name("snap-a"));
}

#[test]
fn snapshot_ref_name_is_deterministic() {
    assert_eq!(snapshot_ref_name("snap-a"), "snap-a-volumesnapshot");
    assert_eq!(snapshot_ref_name("snap-a"), snapshot_ref_name("snap-a"));
}

// ============================================================================
// Spec Derivation Tests
// ============================================================================

#[test]
fn derived_spec_preserves_backend_identity() {
    let source = source_content("snap-a");
    let derived = derive_clone_spec(&source);

    assert_eq!(derived.deletion_policy, source.spec.deletion_policy);
    assert_eq!(derived.driver, source.spec.driver);
    assert_eq!(
        derived.source.snapshot_handle.as_deref(),
        Some("snap-handle-123")
    );
}

#[test]
fn derived_spec_overrides_reference_namespace() {
    let mut source = source_content("snap-a");
    source.spec.volume_snapshot_ref.namespace = Some("some-other-namespace".to_string());

    let derived = derive_clone_spec(&source);

    assert_eq!(
        derived.volume_snapshot_ref.namespace.as_deref(),
        Some(PROTECTED_NAMESPACE)
    );
}

#[test]
fn derived_spec_synthesizes_reference_name() {
    let source = source_content("snap-a");
    let derived = derive_clone_spec(&source);

    assert_eq!(
        derived.volume_snapshot_ref.name.as_deref(),
        Some("snap-a-volumesnapshot")
    );
    assert_eq!(derived.volume_snapshot_ref.api_version.as_deref(), Some("v1"));
    assert_eq!(
        derived.volume_snapshot_ref.kind.as_deref(),
        Some("VolumeSnapshot")
    );
    // The referent's uid is never carried over
    assert!(derived.volume_snapshot_ref.uid.is_none());
}

#[test]
fn derived_spec_takes_handle_from_status_not_spec() {
    let mut source = source_content("snap-a");
    source.spec.source.snapshot_handle = Some("stale-spec-handle".to_string());

    let derived = derive_clone_spec(&source);

    assert_eq!(
        derived.source.snapshot_handle.as_deref(),
        Some("snap-handle-123")
    );
    assert!(derived.source.volume_handle.is_none());
}

#[test]
fn derived_spec_handles_absent_status() {
    let mut source = source_content("snap-a");
    source.status = None;

    let derived = derive_clone_spec(&source);

    assert!(derived.source.snapshot_handle.is_none());
}

#[test]
fn derived_spec_does_not_inherit_snapshot_class() {
    let source = source_content("snap-a");
    let derived = derive_clone_spec(&source);

    assert!(derived.volume_snapshot_class_name.is_none());
}

#[test]
fn derivation_does_not_mutate_the_source() {
    let source = source_content("snap-a");
    let before = source.clone();

    let _ = derive_clone_spec(&source);

    assert_eq!(source.spec, before.spec);
    assert_eq!(source.status, before.status);
}

#[test]
fn derivation_is_idempotent() {
    let source = source_content("snap-a");
    assert_eq!(derive_clone_spec(&source), derive_clone_spec(&source));
}

// ============================================================================
// Desired Clone / Ownership Tests
// ============================================================================

#[test]
fn desired_clone_carries_controller_owner_reference() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");

    let clone = desired_clone(&backup, &source).unwrap();

    assert_eq!(clone.metadata.name.as_deref(), Some("snap-a-clone"));

    let refs = clone.metadata.owner_references.as_deref().unwrap_or(&[]);
    assert_eq!(refs.len(), 1);
    let owner = &refs[0];
    assert_eq!(owner.api_version, "datamover.oso.sh/v1alpha1");
    assert_eq!(owner.kind, "SnapshotBackup");
    assert_eq!(owner.name, "test-backup");
    assert_eq!(owner.uid, "33333333-dddd-eeee-ffff-444444444444");
    assert_eq!(owner.controller, Some(true));
}

#[test]
fn desired_clone_requires_backup_uid() {
    let mut backup = backup_for("snap-a");
    backup.metadata.uid = None;
    let source = source_content("snap-a");

    let result = desired_clone(&backup, &source);

    assert!(matches!(result, Err(Error::OwnershipSet(_))));
}

#[test]
fn set_controller_reference_is_idempotent() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let mut clone = desired_clone(&backup, &source).unwrap();

    let refs_before = clone.metadata.owner_references.clone();
    let owner = refs_before.as_deref().unwrap()[0].clone();

    set_controller_reference(&mut clone.metadata, owner).unwrap();

    assert_eq!(clone.metadata.owner_references, refs_before);
}

#[test]
fn set_controller_reference_refuses_to_steal_ownership() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let mut clone = desired_clone(&backup, &source).unwrap();

    let mut other_backup = backup_for("snap-a");
    other_backup.metadata.name = Some("other-backup".to_string());
    other_backup.metadata.uid = Some("55555555-0000-0000-0000-666666666666".to_string());
    let other_source = source_content("snap-a");
    let other_owner = desired_clone(&other_backup, &other_source)
        .unwrap()
        .metadata
        .owner_references
        .unwrap()[0]
        .clone();

    let result = set_controller_reference(&mut clone.metadata, other_owner);

    assert!(matches!(result, Err(Error::OwnershipSet(_))));
}

// ============================================================================
// Apply Decision Tests
// ============================================================================

#[test]
fn apply_decision_creates_when_clone_is_absent() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let desired = desired_clone(&backup, &source).unwrap();

    let op = apply_decision(None, &desired).unwrap();

    assert_eq!(op, Operation::Created);
}

#[test]
fn apply_decision_is_a_no_op_once_converged() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let desired = desired_clone(&backup, &source).unwrap();

    // First pass creates; once the desired state is persisted, every
    // subsequent pass writes nothing (and therefore emits nothing)
    assert_eq!(apply_decision(None, &desired).unwrap(), Operation::Created);

    let persisted = desired.clone();
    assert_eq!(
        apply_decision(Some(&persisted), &desired).unwrap(),
        Operation::Unchanged
    );
    assert_eq!(
        apply_decision(Some(&persisted), &desired).unwrap(),
        Operation::Unchanged
    );
}

#[test]
fn apply_decision_updates_on_spec_drift() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let desired = desired_clone(&backup, &source).unwrap();

    let mut persisted = desired.clone();
    persisted.spec.driver = "other.driver.io".to_string();

    assert_eq!(
        apply_decision(Some(&persisted), &desired).unwrap(),
        Operation::Updated
    );
}

#[test]
fn apply_decision_updates_when_owner_is_missing() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let desired = desired_clone(&backup, &source).unwrap();

    // Spec matches field-for-field, but the persisted clone lost its owner
    let mut persisted = desired.clone();
    persisted.metadata.owner_references = None;

    assert_eq!(
        apply_decision(Some(&persisted), &desired).unwrap(),
        Operation::Updated
    );
}

#[test]
fn apply_decision_requires_controller_owner_on_desired() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");
    let mut desired = desired_clone(&backup, &source).unwrap();
    desired.metadata.owner_references = None;

    let result = apply_decision(None, &desired);

    assert!(matches!(result, Err(Error::OwnershipSet(_))));
}

// ============================================================================
// Missing Source Tests
// ============================================================================

#[test]
fn missing_source_yields_source_missing_error() {
    let result = require_source("snap-a", None);

    match result {
        Err(Error::SourceMissing(name)) => assert_eq!(name, "snap-a"),
        other => panic!("expected SourceMissing, got {:?}", other.map(|c| c.spec)),
    }
}

#[test]
fn present_source_passes_through_unmodified() {
    let source = source_content("snap-a");
    let resolved = require_source("snap-a", Some(source.clone())).unwrap();

    assert_eq!(resolved.spec, source.spec);
    assert_eq!(resolved.status, source.status);
}

// ============================================================================
// Operation Tests
// ============================================================================

#[test]
fn operation_display_matches_event_wording() {
    assert_eq!(Operation::Created.to_string(), "created");
    assert_eq!(Operation::Updated.to_string(), "updated");
    assert_eq!(Operation::Unchanged.to_string(), "unchanged");
}

// ============================================================================
// End-to-End Derivation Scenario
// ============================================================================

#[test]
fn full_mirror_scenario_for_snap_a() {
    let backup = backup_for("snap-a");
    let source = source_content("snap-a");

    let clone = desired_clone(&backup, &source).unwrap();

    assert_eq!(clone.metadata.name.as_deref(), Some("snap-a-clone"));
    assert_eq!(clone.spec.driver, "csi.example.io");
    assert_eq!(clone.spec.deletion_policy, "Delete");
    assert_eq!(
        clone.spec.source.snapshot_handle.as_deref(),
        Some("snap-handle-123")
    );

    let snap_ref = &clone.spec.volume_snapshot_ref;
    assert_eq!(snap_ref.api_version.as_deref(), Some("v1"));
    assert_eq!(snap_ref.kind.as_deref(), Some("VolumeSnapshot"));
    assert_eq!(snap_ref.namespace.as_deref(), Some(PROTECTED_NAMESPACE));
    assert_eq!(snap_ref.name.as_deref(), Some("snap-a-volumesnapshot"));

    let owner = &clone.metadata.owner_references.as_deref().unwrap()[0];
    assert_eq!(owner.name, "test-backup");
    assert_eq!(owner.controller, Some(true));

    // Re-deriving yields the exact same persisted shape
    let again = desired_clone(&backup, &source).unwrap();
    assert_eq!(again.spec, clone.spec);
    assert_eq!(again.metadata.owner_references, clone.metadata.owner_references);
}
