//! SnapshotBackup mirror reconciler
//!
//! Handles the business logic for mirroring a VolumeSnapshotContent:
//! - Spec validation
//! - Deriving the clone spec from the source content
//! - Idempotent create-or-update of the clone, owned by the SnapshotBackup
//! - Status updates

use std::fmt;

use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{
    api::{Patch, PatchParams, PostParams},
    runtime::events::{Event, EventType, Recorder, Reporter},
    Api, Client, Resource, ResourceExt,
};
use serde_json::json;
use tracing::{info, warn};

use crate::crd::{
    SnapshotBackup, VolumeSnapshotContent, VolumeSnapshotContentSource, VolumeSnapshotContentSpec,
    VolumeSnapshotRef,
};
use crate::error::{Error, Result};

/// Namespace the clone's VolumeSnapshot reference is relocated into
pub const PROTECTED_NAMESPACE: &str = "openshift-adp";

/// Controller name reported on published Events
pub const CONTROLLER_NAME: &str = "snapshot-mirror-operator";

/// Event reason for a created or updated clone
pub const REASON_RECONCILED: &str = "VolumeSnapshotContentReconciled";

/// Outcome of an idempotent apply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Persisted state already matched the derived spec; nothing written
    Unchanged,
    /// Clone did not exist and was created
    Created,
    /// Clone existed with a diverged spec or missing owner and was replaced
    Updated,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Unchanged => write!(f, "unchanged"),
            Operation::Created => write!(f, "created"),
            Operation::Updated => write!(f, "updated"),
        }
    }
}

/// Validate the SnapshotBackup spec
pub fn validate(backup: &SnapshotBackup) -> Result<()> {
    if backup.spec.volume_snapshot_content.name.trim().is_empty() {
        return Err(Error::validation(
            "volumeSnapshotContent.name must reference a VolumeSnapshotContent",
        ));
    }
    Ok(())
}

/// Name of the clone derived from a source content name
pub fn clone_name(source_name: &str) -> String {
    format!("{}-clone", source_name)
}

/// Name of the VolumeSnapshot the clone's reference points at
pub fn snapshot_ref_name(source_name: &str) -> String {
    format!("{}-volumesnapshot", source_name)
}

/// Derive the clone spec from a source VolumeSnapshotContent
///
/// Pure function. Deletion policy and driver are copied verbatim so the clone
/// stays on the backend's retain/delete contract. The VolumeSnapshot reference
/// keeps the source's apiVersion/kind but is relocated unconditionally into
/// the protected namespace under a synthesized name. The backend snapshot
/// handle comes from the source's *status*, which is what makes the clone
/// resolve to the same physical snapshot instead of provisioning a new one.
pub fn derive_clone_spec(source: &VolumeSnapshotContent) -> VolumeSnapshotContentSpec {
    VolumeSnapshotContentSpec {
        deletion_policy: source.spec.deletion_policy.clone(),
        driver: source.spec.driver.clone(),
        // TODO: resolve and attach the bound VolumeSnapshot itself; today the
        // synthesized name is an out-of-band convention the restore side
        // must satisfy.
        volume_snapshot_ref: VolumeSnapshotRef {
            api_version: source.spec.volume_snapshot_ref.api_version.clone(),
            kind: source.spec.volume_snapshot_ref.kind.clone(),
            namespace: Some(PROTECTED_NAMESPACE.to_string()),
            name: Some(snapshot_ref_name(&source.name_any())),
            uid: None,
        },
        source: VolumeSnapshotContentSource {
            volume_handle: None,
            snapshot_handle: source
                .status
                .as_ref()
                .and_then(|s| s.snapshot_handle.clone()),
        },
        volume_snapshot_class_name: None,
    }
}

/// Build the full desired clone object, owner reference included
///
/// The owner reference is attached before the object is ever written, so no
/// persisted clone can exist without the SnapshotBackup as its controller.
pub fn desired_clone(
    backup: &SnapshotBackup,
    source: &VolumeSnapshotContent,
) -> Result<VolumeSnapshotContent> {
    let owner = backup.controller_owner_ref(&()).ok_or_else(|| {
        Error::ownership("SnapshotBackup is missing metadata.name or metadata.uid")
    })?;

    let mut clone =
        VolumeSnapshotContent::new(&clone_name(&source.name_any()), derive_clone_spec(source));
    set_controller_reference(&mut clone.metadata, owner)?;
    Ok(clone)
}

/// Attach a controller owner reference, refusing to steal ownership
pub fn set_controller_reference(meta: &mut ObjectMeta, owner: OwnerReference) -> Result<()> {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    if let Some(current) = refs.iter().find(|r| r.controller == Some(true)) {
        if current.uid != owner.uid {
            return Err(Error::ownership(format!(
                "already controlled by {} {}",
                current.kind, current.name
            )));
        }
        return Ok(());
    }
    refs.push(owner);
    Ok(())
}

/// Whether the persisted clone already carries the desired controller owner
fn has_controller_owner(existing: &VolumeSnapshotContent, owner: &OwnerReference) -> bool {
    existing
        .owner_references()
        .iter()
        .any(|r| r.controller == Some(true) && r.uid == owner.uid)
}

/// Decide what the apply must do, given the persisted clone (if any)
///
/// Pure function: no write happens when the persisted spec already matches
/// field-for-field and the controller owner is in place, so repeated
/// invocations after convergence always land on `Unchanged`.
pub fn apply_decision(
    existing: Option<&VolumeSnapshotContent>,
    desired: &VolumeSnapshotContent,
) -> Result<Operation> {
    let owner = desired
        .owner_references()
        .iter()
        .find(|r| r.controller == Some(true))
        .ok_or_else(|| Error::ownership("desired clone has no controller owner reference"))?;

    match existing {
        None => Ok(Operation::Created),
        Some(existing) => {
            if existing.spec == desired.spec && has_controller_owner(existing, owner) {
                Ok(Operation::Unchanged)
            } else {
                Ok(Operation::Updated)
            }
        }
    }
}

/// Idempotently apply the desired clone: create-if-absent, update-if-differs
///
/// Updates reuse the resourceVersion read in the same pass, so a concurrently
/// changed clone surfaces as `ApplyConflict` rather than being silently
/// overwritten. A lost create race is reported the same way; re-invocation
/// re-derives against the now-existing clone and converges.
pub async fn apply_clone(
    api: &Api<VolumeSnapshotContent>,
    desired: &VolumeSnapshotContent,
) -> Result<(VolumeSnapshotContent, Operation)> {
    let name = desired.name_any();
    let existing = api.get_opt(&name).await?;

    match apply_decision(existing.as_ref(), desired)? {
        Operation::Created => match api.create(&PostParams::default(), desired).await {
            Ok(created) => Ok((created, Operation::Created)),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(Error::conflict(format!(
                "lost create race for volumesnapshotcontent {}",
                name
            ))),
            Err(e) => Err(e.into()),
        },
        Operation::Unchanged => {
            // the decision is Unchanged only for a clone read in this pass
            let current = existing.ok_or_else(|| {
                Error::conflict(format!("volumesnapshotcontent {} vanished during apply", name))
            })?;
            Ok((current, Operation::Unchanged))
        }
        Operation::Updated => {
            let current = existing.ok_or_else(|| {
                Error::conflict(format!("volumesnapshotcontent {} vanished during apply", name))
            })?;
            let owner = desired
                .owner_references()
                .iter()
                .find(|r| r.controller == Some(true))
                .cloned()
                .ok_or_else(|| {
                    Error::ownership("desired clone has no controller owner reference")
                })?;

            let mut updated = current.clone();
            updated.spec = desired.spec.clone();
            set_controller_reference(&mut updated.metadata, owner)?;

            match api.replace(&name, &PostParams::default(), &updated).await {
                Ok(replaced) => Ok((replaced, Operation::Updated)),
                Err(kube::Error::Api(ae)) if ae.code == 409 => Err(Error::conflict(format!(
                    "stale resourceVersion replacing volumesnapshotcontent {}",
                    name
                ))),
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Resolve a fetched source, mapping absence to the distinct error kind
///
/// Keeps the SourceMissing mapping out of the I/O path so the contract is
/// directly testable: a missing source fails before any clone is derived,
/// written, or announced.
pub fn require_source(
    name: &str,
    found: Option<VolumeSnapshotContent>,
) -> Result<VolumeSnapshotContent> {
    found.ok_or_else(|| Error::SourceMissing(name.to_string()))
}

/// Mirror the VolumeSnapshotContent referenced by a SnapshotBackup
///
/// Returns `Ok(true)` once the clone is converged. Every failure is returned
/// to the caller; retries happen only by re-invocation.
pub async fn mirror_snapshot(client: &Client, namespace: &str, name: &str) -> Result<bool> {
    let backups: Api<SnapshotBackup> = Api::namespaced(client.clone(), namespace);
    // A missing SnapshotBackup propagates as-is; the scheduler stops requeueing
    let backup = backups.get(name).await?;

    let contents: Api<VolumeSnapshotContent> = Api::all(client.clone());
    let source_name = &backup.spec.volume_snapshot_content.name;
    let source = require_source(source_name, contents.get_opt(source_name).await?)?;

    let desired = desired_clone(&backup, &source)?;
    let (applied, op) = apply_clone(&contents, &desired).await?;

    if op != Operation::Unchanged {
        info!(
            clone = %applied.name_any(),
            source = %source.name_any(),
            operation = %op,
            "Mirrored VolumeSnapshotContent"
        );
        publish_mirror_event(client, &applied, op).await;
    }

    Ok(true)
}

/// Publish a Normal event on the clone describing the apply outcome
///
/// Fire-and-forget: a failed event must never fail the reconcile.
async fn publish_mirror_event(client: &Client, clone: &VolumeSnapshotContent, op: Operation) {
    let reporter = Reporter {
        controller: CONTROLLER_NAME.to_string(),
        instance: None,
    };
    let recorder = Recorder::new(client.clone(), reporter, clone.object_ref(&()));
    let event = Event {
        type_: EventType::Normal,
        reason: REASON_RECONCILED.to_string(),
        note: Some(format!(
            "performed {} on volumesnapshotcontent {}",
            op,
            clone.name_any()
        )),
        action: "Mirror".to_string(),
        secondary: None,
    };
    if let Err(e) = recorder.publish(event).await {
        warn!(error = %e, "Failed to publish mirror event");
    }
}

/// Update status after a successful mirror
pub async fn update_status_completed(
    backup: &SnapshotBackup,
    client: &Client,
    namespace: &str,
) -> Result<()> {
    let name = backup.name_any();
    let api: Api<SnapshotBackup> = Api::namespaced(client.clone(), namespace);
    let mirrored = clone_name(&backup.spec.volume_snapshot_content.name);

    let status = json!({
        "status": {
            "phase": "Completed",
            "message": "VolumeSnapshotContent mirrored",
            "mirroredContentName": mirrored,
            "lastMirrorTime": Utc::now(),
            "observedGeneration": backup.metadata.generation,
            "conditions": [{
                "type": "Ready",
                "status": "True",
                "lastTransitionTime": Utc::now(),
                "reason": "SnapshotMirrored",
                "message": format!("VolumeSnapshotContent {} is converged", mirrored)
            }]
        }
    });

    api.patch_status(&name, &PatchParams::apply(CONTROLLER_NAME), &Patch::Merge(status))
        .await?;

    Ok(())
}

/// Update status to Failed
pub async fn update_status_failed(
    backup: &SnapshotBackup,
    client: &Client,
    namespace: &str,
    error_message: &str,
) -> Result<()> {
    let name = backup.name_any();
    let api: Api<SnapshotBackup> = Api::namespaced(client.clone(), namespace);

    let status = json!({
        "status": {
            "phase": "Failed",
            "message": error_message,
            "observedGeneration": backup.metadata.generation,
            "conditions": [{
                "type": "Ready",
                "status": "False",
                "lastTransitionTime": Utc::now(),
                "reason": "MirrorFailed",
                "message": error_message
            }]
        }
    });

    api.patch_status(&name, &PatchParams::apply(CONTROLLER_NAME), &Patch::Merge(status))
        .await?;

    Ok(())
}
