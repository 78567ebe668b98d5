//! Append-only, time-windowed journal of room mutations.
//!
//! Stateless polling clients can't be pushed to, so each one asks
//! roughly once a second: "did anything change, and was it me?" The
//! journal answers with a *change token*: a content hash of the
//! recent updates the requester didn't cause. The client diffs the
//! token against the last one it saw; any difference triggers a full
//! room re-fetch. No token means nothing to refresh.
//!
//! Entries age out of the journal after the refresh window Δ
//! ([`DEFAULT_REFRESH_WINDOW`]), so the journal is bounded by time,
//! not by count, and a quiet room's journal drains to empty.
//!
//! [`Journal::refresh`] is a pure function over `(entries, now,
//! requester, window)`; callers inject the timestamp, which keeps
//! every time-dependent test deterministic without sleeping.

use felt_token::Fingerprint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default refresh window Δ, in the same time units as update
/// timestamps (seconds in production).
pub const DEFAULT_REFRESH_WINDOW: i64 = 2;

/// A single recorded room mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// When the mutation happened.
    pub timestamp: i64,
    /// Who caused it; the system fingerprint for unattributed changes.
    pub updater: Fingerprint,
    /// Force delivery to every poller, including the updater. Used by
    /// mutations whose effect the actor's own browser must also
    /// re-fetch (draws, deletes, reveals).
    pub update_all: bool,
    /// Optional human-readable message, surfaced verbatim to pollers
    /// ("alert" broadcasts). Empty for ordinary updates.
    pub message: String,
}

impl Update {
    /// An ordinary update attributed to one actor. The actor's own
    /// poller will not be nudged by it.
    pub fn attributed(updater: Fingerprint, timestamp: i64) -> Self {
        Self {
            timestamp,
            updater,
            update_all: false,
            message: String::new(),
        }
    }

    /// An update every poller must observe, attributed to an actor.
    pub fn broadcast_from(updater: Fingerprint, timestamp: i64) -> Self {
        Self {
            timestamp,
            updater,
            update_all: true,
            message: String::new(),
        }
    }

    /// An unattributed update every poller must observe.
    pub fn broadcast(timestamp: i64) -> Self {
        Self::broadcast_from(Fingerprint::system(), timestamp)
    }

    /// An unattributed update carrying a message for every poller.
    pub fn alert(message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            timestamp,
            updater: Fingerprint::system(),
            update_all: false,
            message: message.into(),
        }
    }
}

/// The ordered journal of a room's recent mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<Update>,
}

impl Journal {
    /// An empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an update. Callers run this inside the same transaction
    /// as the mutation it records.
    pub fn append(&mut self, update: Update) {
        self.entries.push(update);
    }

    /// Prunes entries older than `window` and answers the requester's
    /// poll.
    ///
    /// Of the surviving entries, those not authored by `requester`
    /// (plus any flagged `update_all`) form the deliverable subset;
    /// the returned token is the hex SHA-256 of that subset's JSON.
    /// When a surviving deliverable entry carries a message, the token
    /// is prefixed `digest||message` so the client can show it.
    ///
    /// Returns `None` when nothing passes the filter, meaning nothing to
    /// refresh. Calling twice with the same `now` and no intervening
    /// append returns the same answer both times.
    pub fn refresh(
        &mut self,
        now: i64,
        requester: &Fingerprint,
        window: i64,
    ) -> Option<String> {
        self.entries.retain(|u| now - u.timestamp <= window);

        let send: Vec<&Update> = self
            .entries
            .iter()
            .filter(|u| u.updater != *requester || u.update_all)
            .collect();
        if send.is_empty() {
            return None;
        }
        change_token(&send)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The retained entries, oldest first.
    pub fn entries(&self) -> &[Update] {
        &self.entries
    }
}

/// Hashes the deliverable subset into a change token.
fn change_token(send: &[&Update]) -> Option<String> {
    let bytes = match serde_json::to_vec(send) {
        Ok(bytes) => bytes,
        Err(err) => {
            // Can't happen for these types in practice; degrade to
            // "nothing to refresh" rather than poisoning every poller.
            tracing::error!(%err, "could not serialize updates for change token");
            return None;
        }
    };
    let digest = hex::encode(Sha256::digest(&bytes));
    for update in send {
        if !update.message.is_empty() {
            return Some(format!("{digest}||{}", update.message));
        }
    }
    Some(digest)
}
