//! Error types for the Snapshot Mirror Operator

use thiserror::Error;

/// Result type alias using the operator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Operator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    ///
    /// Covers a missing SnapshotBackup as well: a NotFound on the request
    /// itself propagates unchanged so the scheduler can stop requeueing it.
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The referenced source VolumeSnapshotContent does not exist
    ///
    /// Retryable: the snapshot subsystem may still be provisioning it.
    #[error("source VolumeSnapshotContent not found: {0}")]
    SourceMissing(String),

    /// Optimistic-concurrency conflict while applying the clone
    ///
    /// Always retryable; the spec must be re-derived against fresh state.
    #[error("conflict applying VolumeSnapshotContent clone: {0}")]
    ApplyConflict(String),

    /// Owner reference could not be built or attached
    #[error("failed to set owner reference: {0}")]
    OwnershipSet(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an apply-conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::ApplyConflict(msg.into())
    }

    /// Create an ownership error
    pub fn ownership(msg: impl Into<String>) -> Self {
        Error::OwnershipSet(msg.into())
    }
}
