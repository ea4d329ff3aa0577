//! OSO Snapshot Mirror Kubernetes Operator
//!
//! This operator mirrors CSI VolumeSnapshotContent resources: for each
//! SnapshotBackup it clones the referenced content, pointing the clone at the
//! same backend snapshot handle while relocating its VolumeSnapshot reference
//! into a protected namespace.

pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod reconcilers;

pub use error::{Error, Result};
