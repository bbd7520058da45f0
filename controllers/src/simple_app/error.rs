use reqwest::StatusCode;
use thiserror::Error;

/// Failures the reconciler distinguishes when deciding how much of a cycle
/// to abandon. Transport and status errors are transient: the next cycle
/// retries them naturally. Validation and ownership errors stay until an
/// operator changes the offending object.
#[derive(Debug, Error)]
pub enum Error {
    #[error("api request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("api server returned {status} for {path}: {message}")]
    ApiStatus {
        status: StatusCode,
        path: String,
        message: String,
    },

    #[error("volume for path {mount_path} in {namespace}.{name} does not have a source type")]
    VolumeWithoutSource {
        mount_path: String,
        namespace: String,
        name: String,
    },

    #[error("found {kind} {namespace}.{name} not managed by us")]
    NotManaged {
        kind: &'static str,
        namespace: String,
        name: String,
    },
}

impl Error {
    /// Whether reconciliation of the owning specification should stop
    /// instead of moving on to its next derived resource.
    pub fn halts_spec(&self) -> bool {
        matches!(
            self,
            Error::NotManaged { .. } | Error::VolumeWithoutSource { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
