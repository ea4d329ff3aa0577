//! SnapshotBackup controller
//!
//! Watches SnapshotBackup resources and drives the mirror reconciler. The
//! cloned VolumeSnapshotContents are watched through their owner reference, so
//! drift on a clone re-triggers reconciliation of its SnapshotBackup.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::{
    api::ListParams,
    runtime::{
        controller::{Action, Controller},
        watcher::Config as WatcherConfig,
    },
    Api, Client, ResourceExt,
};
use tracing::{error, info, instrument, warn};

use crate::controllers::Context;
use crate::crd::{SnapshotBackup, VolumeSnapshotContent};
use crate::error::{Error, Result};
use crate::metrics;
use crate::reconcilers::mirror;

/// Run the SnapshotBackup controller
pub async fn run(client: Client, context: Arc<Context>) {
    let api: Api<SnapshotBackup> = Api::all(client.clone());

    // Verify CRD is installed
    if let Err(e) = api.list(&ListParams::default().limit(1)).await {
        error!("SnapshotBackup CRD not installed: {}", e);
        return;
    }

    info!("Starting SnapshotBackup controller");

    let contents: Api<VolumeSnapshotContent> = Api::all(client.clone());

    Controller::new(api, WatcherConfig::default())
        .owns(contents, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    info!(
                        name = %obj.name,
                        namespace = obj.namespace.as_deref().unwrap_or("default"),
                        "Reconciled SnapshotBackup"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation error");
                    metrics::RECONCILIATION_ERRORS
                        .with_label_values(&["SnapshotBackup"])
                        .inc();
                }
            }
        })
        .await;
}

/// Main reconciliation function
///
/// No finalizer is registered: the clone's lifecycle is bound to the
/// SnapshotBackup through its owner reference, so deletion is handled entirely
/// by the API server's garbage collector.
#[instrument(skip(ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<SnapshotBackup>, ctx: Arc<Context>) -> Result<Action> {
    let _timer = metrics::RECONCILE_DURATION
        .with_label_values(&["SnapshotBackup"])
        .start_timer();
    metrics::RECONCILIATIONS
        .with_label_values(&["SnapshotBackup"])
        .inc();

    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    // Validate the spec before touching the API
    if let Err(e) = mirror::validate(&obj) {
        warn!(error = %e, "Validation failed");
        mirror::update_status_failed(&obj, &ctx.client, &namespace, &e.to_string()).await?;
        return Ok(Action::requeue(Duration::from_secs(300)));
    }

    match mirror::mirror_snapshot(&ctx.client, &namespace, &name).await {
        Ok(_) => {
            metrics::MIRRORS_TOTAL
                .with_label_values(&["success", &namespace, &name])
                .inc();
            mirror::update_status_completed(&obj, &ctx.client, &namespace).await?;
            // Converged; periodic requeue catches drift the watch misses
            Ok(Action::requeue(Duration::from_secs(300)))
        }
        Err(e) => {
            metrics::MIRRORS_TOTAL
                .with_label_values(&["failure", &namespace, &name])
                .inc();
            if let Err(se) =
                mirror::update_status_failed(&obj, &ctx.client, &namespace, &e.to_string()).await
            {
                warn!(error = %se, "Failed to record Failed status");
            }
            Err(e)
        }
    }
}

/// Error policy for the controller
fn error_policy(obj: Arc<SnapshotBackup>, error: &Error, _ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    error!(
        name = %name,
        error = %error,
        "Reconciliation failed, scheduling retry"
    );

    // Conflicts retry immediately against fresh state; a missing source may
    // still be provisioning; validation problems need a spec change
    let requeue_duration = match error {
        Error::ApplyConflict(_) => Duration::from_secs(1),
        Error::SourceMissing(_) => Duration::from_secs(15),
        Error::Kube(_) => Duration::from_secs(30),
        Error::Validation(_) | Error::OwnershipSet(_) => Duration::from_secs(300),
        _ => Duration::from_secs(30),
    };

    Action::requeue(requeue_duration)
}
