//! Runtime failure taxonomy for the frame loop.
//!
//! Only `InputUnavailable` is fatal to the loop. Perception and persistence
//! failures are reported and absorbed so the live loop keeps running.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    /// The frame source cannot produce frames.
    #[error("input unavailable: {0:#}")]
    InputUnavailable(anyhow::Error),

    /// A detector or pose call failed or returned malformed output.
    #[error("perception failure: {0:#}")]
    PerceptionFailure(anyhow::Error),

    /// The violation journal could not be appended.
    #[error("failed to append violation journal {}: {source}", path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The evidentiary snapshot could not be encoded or written.
    #[error("failed to write snapshot {}: {source}", path.display())]
    SnapshotFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl SentinelError {
    /// True for failures that must stop the frame loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SentinelError::InputUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn only_input_loss_is_fatal() {
        assert!(SentinelError::InputUnavailable(anyhow!("camera gone")).is_fatal());
        assert!(!SentinelError::PerceptionFailure(anyhow!("bad tensor")).is_fatal());
        let err = SentinelError::PersistenceFailure {
            path: PathBuf::from("logs/x.txt"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("logs/x.txt"));
    }
}
