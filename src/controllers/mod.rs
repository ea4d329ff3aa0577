//! Kubernetes controllers for the Snapshot Mirror Operator
//!
//! This module contains the controller implementation that watches for CRD
//! changes and triggers reconciliation.

mod snapshot_backup_controller;

pub use snapshot_backup_controller::run as run_snapshot_backup_controller;

use kube::Client;

/// Shared context for controllers
pub struct Context {
    /// Kubernetes client
    pub client: Client,
}

impl Context {
    /// Create a new context
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}
