//! Snapshot and action payload codec
//!
//! Every payload is one self-describing JSON document. Snapshots carry the
//! whole session; there is no delta encoding and no schema version.

use crate::protocol::Action;
use crate::types::Session;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Snapshot violates session invariants: {0}")]
    Invariant(String),
}

/// Serialize the full session
pub fn encode_snapshot(session: &Session) -> CodecResult<String> {
    Ok(serde_json::to_string(session)?)
}

/// Deserialize a snapshot, rejecting values no host could have produced
pub fn decode_snapshot(payload: &str) -> CodecResult<Session> {
    let session: Session = serde_json::from_str(payload)?;
    session.check_invariants().map_err(CodecError::Invariant)?;
    Ok(session)
}

pub fn encode_action(action: &Action) -> CodecResult<String> {
    Ok(serde_json::to_string(action)?)
}

pub fn decode_action(payload: &str) -> CodecResult<Action> {
    Ok(serde_json::from_str(payload)?)
}
