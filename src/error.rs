//! Error type shared by every detection and synchronization step.
use thiserror::Error;

/// Which of the two recordings an error or anchor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Intracranial LFP recording.
    Intracranial,
    /// External (EEG/ECG rig) recording.
    External,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Intracranial => f.write_str("intracranial"),
            Side::External => f.write_str("external"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no stimulation artifact found in {side} recording (method {method})")]
    NoArtifactFound { side: Side, method: String },

    #[error("invalid detection method {0:?}; valid tags are: thresh, 1, 2, manual")]
    InvalidMethod(String),

    #[error("signal too short: {len} samples, need at least {min}")]
    SignalTooShort { len: usize, min: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("manual selection confirmed without any picked sample")]
    EmptySelection,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("every detection method was rejected for the {0} recording")]
    Rejected(Side),
}

pub type Result<T> = std::result::Result<T, SyncError>;
