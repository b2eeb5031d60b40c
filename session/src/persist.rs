//! Byte codec for the session state that survives a restart.

use roll_odds_core::{Entitlements, RollRecords, Target};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const MAGIC: &str = "roll-odds";
const VERSION: u32 = 1;

/// Entitlements, roll records and targets as stored between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Regional and additional entitlement sets.
    pub entitlements: Entitlements,
    /// Roll records of every observed player.
    pub rolls: RollRecords,
    /// Tracked targets.
    pub targets: Vec<Target>,
}

/// Failure to encode or decode persisted state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The bytes do not start with the expected magic string.
    #[error("persisted state has an unexpected header '{0}'")]
    BadHeader(String),
    /// The bytes were written by an unsupported format version.
    #[error("persisted state version {0} is not supported")]
    UnsupportedVersion(u32),
    /// The payload could not be encoded or decoded.
    #[error("could not encode or decode persisted state")]
    Codec(#[from] bincode::Error),
}

#[derive(Deserialize)]
struct Header {
    magic: String,
    version: u32,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    magic: &'a str,
    version: u32,
    state: &'a PersistedState,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "magic")]
    _magic: String,
    #[serde(rename = "version")]
    _version: u32,
    state: PersistedState,
}

/// Encodes `state` behind a magic string and format version.
pub fn serialize(state: &PersistedState) -> Result<Vec<u8>, PersistError> {
    let envelope = EnvelopeRef {
        magic: MAGIC,
        version: VERSION,
        state,
    };
    Ok(bincode::serialize(&envelope)?)
}

/// Decodes state written by [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<PersistedState, PersistError> {
    let header: Header = bincode::deserialize(bytes)?;
    if header.magic != MAGIC {
        return Err(PersistError::BadHeader(header.magic));
    }
    if header.version != VERSION {
        return Err(PersistError::UnsupportedVersion(header.version));
    }
    let envelope: Envelope = bincode::deserialize(bytes)?;
    Ok(envelope.state)
}

/// Decodes state, substituting an empty state when the bytes are unusable.
#[must_use]
pub fn restore_or_default(bytes: &[u8]) -> PersistedState {
    deserialize(bytes).unwrap_or_else(|error| {
        warn!(%error, "discarding unreadable persisted state");
        PersistedState::default()
    })
}
