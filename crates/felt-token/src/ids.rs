//! Identity types shared across the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a room.
///
/// Newtype over `u64` so a room key can never be confused with a die
/// key in a signature. `#[serde(transparent)]` keeps the serialized
/// form a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(pub u64);

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A unique identifier for a die, parented to exactly one room.
///
/// The parent key is embedded in the die key: the ancestor
/// relationship is structural, so "all dice in this room" needs no
/// secondary index and a die can never be reparented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DieKey {
    /// The owning room.
    pub room: RoomKey,
    /// Unique within the store (not just within the room).
    pub id: u64,
}

impl fmt::Display for DieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}.{}", self.room.0, self.id)
    }
}

/// A client-supplied opaque identifier used for update attribution and
/// hide/reveal ownership.
///
/// This is a cooperative check, not a security boundary: nothing stops
/// a client from presenting someone else's fingerprint. It exists so
/// pollers can tell their own actions apart from everyone else's, and
/// so "you hid it, you reveal it" works for honest participants.
///
/// The empty fingerprint is the *system* actor: unattributed updates
/// and legacy hides carry it, and it passes every ownership check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps a client-supplied fingerprint string.
    pub fn new(fp: impl Into<String>) -> Self {
        Self(fp.into())
    }

    /// The unattributed system actor.
    pub fn system() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the unattributed system actor.
    pub fn is_system(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw fingerprint string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<system>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for Fingerprint {
    fn from(fp: &str) -> Self {
        Self::new(fp)
    }
}
