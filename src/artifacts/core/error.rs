//! Error taxonomy
//!
//! Operations return `anyhow::Result` so that context can be layered on top,
//! but the root cause of every classified failure is a [`BruvError`]. Callers
//! that need to branch on the kind of failure use `downcast_ref`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BruvError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("corrupt object: {0}")]
    CorruptObject(String),
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
    #[error("corrupt pack: {0}")]
    CorruptPack(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("write rejected: {0}")]
    WriteRejected(String),
    #[error("not a bruv repository (or any of the parent directories): {0}")]
    NotARepository(String),
    #[error("invalid ref: {0}")]
    InvalidRef(String),
}

impl BruvError {
    /// Find the classified cause of an error chain, if there is one.
    pub fn classify(error: &anyhow::Error) -> Option<&BruvError> {
        error.chain().find_map(|cause| cause.downcast_ref::<BruvError>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classify_finds_root_cause_below_context() {
        let error = Err::<(), _>(BruvError::Conflict("main moved".to_string()))
            .context("approving MR-1")
            .unwrap_err();

        pretty_assertions::assert_eq!(
            BruvError::classify(&error),
            Some(&BruvError::Conflict("main moved".to_string()))
        );
    }

    #[test]
    fn classify_returns_none_for_unclassified_errors() {
        let error = anyhow::anyhow!("plain failure");

        assert!(BruvError::classify(&error).is_none());
    }
}
