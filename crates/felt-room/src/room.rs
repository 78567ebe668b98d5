//! The room aggregate.

use std::collections::BTreeMap;

use felt_deck::CustomSet;
use felt_journal::Journal;
use felt_token::RoomKey;
use serde::{Deserialize, Serialize};

/// The most recent room-level action. Display aggregation peeks at
/// this: a delete keeps the previous roll total on screen, and only a
/// chain of rerolls keeps accumulating into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomAction {
    Roll,
    Reroll,
    Draw,
    Hide,
    Reveal,
    Move,
    Delete,
    Clear,
    Shuffle,
    Image,
    DecrementClock,
}

/// A named shared session: one deck, any number of custom sets, a
/// journal, and the table's sticky settings.
///
/// Everything a room owns lives in this one aggregate so a single
/// transaction can read and write all of it. What used to be
/// process-wide maps in older revisions of this design (last roll,
/// last action) are plain fields here; they survive multi-instance
/// deployment because they travel with the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Identity.
    pub key: RoomKey,
    /// Human-readable name, unique among active rooms
    /// (e.g. "PurpleHappyBadger").
    pub slug: String,
    /// Signature encoding of the deck's remaining cards.
    pub deck_signature: String,
    /// User-authored draw pools, by set name.
    pub custom_sets: BTreeMap<String, CustomSet>,
    /// Optional display backdrop.
    pub background_url: Option<String>,
    /// Sticky integer roll modifier, applied to roll totals until
    /// changed.
    pub modifier: i32,
    /// Running "last roll" total, maintained by roll/reroll.
    pub last_roll: i32,
    /// The most recent room-level action, if any.
    pub last_action: Option<RoomAction>,
    /// Time-windowed journal answering poll refreshes.
    pub journal: Journal,
    /// Last-mutation time.
    pub timestamp: i64,
}

impl Room {
    /// Creates a room with the given slug and deck signature.
    pub fn new(
        key: RoomKey,
        slug: impl Into<String>,
        deck_signature: String,
        timestamp: i64,
    ) -> Self {
        Self {
            key,
            slug: slug.into(),
            deck_signature,
            custom_sets: BTreeMap::new(),
            background_url: None,
            modifier: 0,
            last_roll: 0,
            last_action: None,
            journal: Journal::new(),
            timestamp,
        }
    }
}
