use std::fmt;
use std::net::Ipv4Addr;

use thiserror::Error;

pub type RecodeResult<T> = Result<T, RecodeError>;

/// Per-brigade processing stage, carried in errors and skip logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Recode,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Recode => "recode",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RecodeError {
    #[error("invalid snapshot data: {0}")]
    InvalidSnapshotData(String),

    #[error("keys mismatch: {0}")]
    KeysMismatch(String),

    #[error("snapshot errors: bundle reports {0} failed brigade export(s)")]
    SnapshotErrors(u64),

    #[error("reservation too small: {snapshots} snapshots > {slots} slots")]
    ReservationTooSmall { snapshots: usize, slots: usize },

    #[error("mirrored ip not found: {addr}: {brigade_id}")]
    MirroredIpNotFound { addr: Ipv4Addr, brigade_id: String },

    #[error("mirrored ip duplicated: {addr}: {brigade_id}")]
    MirroredIpDuplicated { addr: Ipv4Addr, brigade_id: String },

    #[error("pinned ip not found in reservation: {addr}: {brigade_id}")]
    PinnedIpNotFound { addr: Ipv4Addr, brigade_id: String },

    #[error("pinned ip duplicated: {addr}: {brigade_id}")]
    PinnedIpDuplicated { addr: Ipv4Addr, brigade_id: String },

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("{stage}: brigade {brigade_id}: {source}")]
    Brigade {
        brigade_id: String,
        stage: Stage,
        #[source]
        source: Box<RecodeError>,
    },
}

impl RecodeError {
    /// Attach the brigade and stage an error surfaced in.
    pub fn in_brigade(self, brigade_id: impl Into<String>, stage: Stage) -> Self {
        RecodeError::Brigade {
            brigade_id: brigade_id.into(),
            stage,
            source: Box::new(self),
        }
    }

    /// Outermost stage recorded on this error, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RecodeError::Brigade { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying category with any `Brigade` wrappers peeled off.
    pub fn root(&self) -> &RecodeError {
        match self {
            RecodeError::Brigade { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for RecodeError {
    fn from(e: serde_json::Error) -> Self {
        RecodeError::Encoding(format!("json: {e}"))
    }
}
