//! Reconcilers for the Snapshot Mirror Operator
//!
//! This module contains the business logic for mirroring snapshot contents.
//! The reconciler is responsible for:
//! - Validating SnapshotBackup specs
//! - Deriving and applying the cloned VolumeSnapshotContent
//! - Updating resource status

pub mod mirror;
