//! Byte encoding for everything the ledger stores: personnel, projects and key indices.
//!
//! Values are JSON. Decoding never fails from the caller's point of view:
//! empty or malformed bytes decode to the type's zero value.

use crate::{KeyIndex, Personnel, Project};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode record: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A value that can be stored at a ledger key.
pub trait Record: Serialize + DeserializeOwned + Default {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }

    /// Strict decode, for callers that want to know a fallback happened.
    fn try_decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    /// Total decode: zero-length or malformed input yields `Self::default()`.
    fn decode(bytes: &[u8]) -> Self {
        Self::try_decode(bytes).unwrap_or_default()
    }
}

impl Record for Personnel {}
impl Record for Project {}
impl Record for KeyIndex {}
