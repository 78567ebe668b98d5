//! The in-memory room repository.
//!
//! Transaction model: [`RoomStore::mutate`] clones a snapshot of the
//! room and its dice under a read lock, hands it to the caller's
//! closure, then commits under a write lock only if the room's version
//! stamp is unchanged. A concurrent commit in the gap means the whole
//! operation re-runs against a fresh snapshot, transparently, up to
//! [`StoreConfig::max_tx_retries`] times. Closures must therefore be
//! re-runnable and free of side effects outside the transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use felt_deck::Deck;
use felt_journal::Update;
use felt_token::{Die, DieKey, RoomKey};
use tokio::sync::RwLock;

use crate::{Room, StoreError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Store behavior knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How many times `mutate` re-runs an operation that keeps losing
    /// the commit race before surfacing [`StoreError::Conflict`].
    pub max_tx_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_tx_retries: 5 }
    }
}

/// The projection order for a room's dice.
///
/// Two callers want two different shapes of the same child set: the
/// display wants a stable sort by result, while totals aggregation
/// wants the most recent batch first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceOrder {
    /// Stable ascending sort by result (display order).
    ByResult,
    /// Descending by timestamp; the newest roll comes first.
    NewestFirst,
    /// Creation order, no sorting.
    Unsorted,
}

// ---------------------------------------------------------------------------
// Store internals
// ---------------------------------------------------------------------------

/// A room plus its children and its optimistic-concurrency stamp.
struct RoomSlot {
    room: Room,
    dice: BTreeMap<u64, Die>,
    version: u64,
}

struct Inner {
    rooms: HashMap<RoomKey, RoomSlot>,
    /// Unique slug index. One slug names at most one active room.
    slugs: HashMap<String, RoomKey>,
    next_room_id: u64,
}

/// Transactional repository for rooms and their dice.
pub struct RoomStore {
    inner: RwLock<Inner>,
    /// Die ids are allocated store-wide so a retried transaction never
    /// reuses an id another commit already claimed.
    next_die_id: AtomicU64,
    config: StoreConfig,
}

impl RoomStore {
    /// Creates an empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                rooms: HashMap::new(),
                slugs: HashMap::new(),
                next_room_id: 1,
            }),
            next_die_id: AtomicU64::new(1),
            config,
        }
    }

    /// Looks up a room by slug, creating it with a fresh shuffled deck
    /// on miss. Returns the key and whether the room was just created.
    ///
    /// This is the self-healing entry point: a stale or collected room
    /// reference resolves to a brand-new room instead of an error, and
    /// the caller redirects there.
    pub async fn get_or_create(&self, slug: &str, now: i64) -> (RoomKey, bool) {
        let mut inner = self.inner.write().await;
        if let Some(key) = inner.slugs.get(slug) {
            return (*key, false);
        }
        let key = RoomKey(inner.next_room_id);
        inner.next_room_id += 1;
        let room = Room::new(key, slug, Deck::new_shuffled().signature(), now);
        inner.slugs.insert(slug.to_string(), key);
        inner.rooms.insert(
            key,
            RoomSlot {
                room,
                dice: BTreeMap::new(),
                version: 0,
            },
        );
        tracing::info!(room = %key, %slug, "room created");
        (key, true)
    }

    /// Resolves a slug without creating anything.
    pub async fn lookup(&self, slug: &str) -> Option<RoomKey> {
        self.inner.read().await.slugs.get(slug).copied()
    }

    /// Returns a clone of the room aggregate.
    pub async fn room(&self, key: RoomKey) -> Result<Room, StoreError> {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(&key)
            .map(|slot| slot.room.clone())
            .ok_or(StoreError::RoomNotFound(key))
    }

    /// Returns a clone of one die.
    pub async fn die(&self, key: DieKey) -> Result<Die, StoreError> {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(&key.room)
            .ok_or(StoreError::RoomNotFound(key.room))?
            .dice
            .get(&key.id)
            .cloned()
            .ok_or(StoreError::DieNotFound(key))
    }

    /// Returns the room's dice in the requested projection order.
    pub async fn dice(
        &self,
        key: RoomKey,
        order: DiceOrder,
    ) -> Result<Vec<Die>, StoreError> {
        let inner = self.inner.read().await;
        let slot = inner
            .rooms
            .get(&key)
            .ok_or(StoreError::RoomNotFound(key))?;
        let mut dice: Vec<Die> = slot.dice.values().cloned().collect();
        match order {
            DiceOrder::ByResult => dice.sort_by_key(|d| (d.result, d.key.id)),
            DiceOrder::NewestFirst => {
                dice.sort_by_key(|d| (std::cmp::Reverse(d.timestamp), std::cmp::Reverse(d.key.id)))
            }
            DiceOrder::Unsorted => {}
        }
        Ok(dice)
    }

    /// Number of rooms in the store.
    pub async fn room_count(&self) -> usize {
        self.inner.read().await.rooms.len()
    }

    /// Runs `op` against a snapshot of the room and its dice, then
    /// commits all-or-nothing.
    ///
    /// The closure may fail with any error type convertible from
    /// [`StoreError`]; a closure error aborts the transaction with no
    /// state change. Commit races retry transparently; only exhausted
    /// retries surface as [`StoreError::Conflict`].
    pub async fn mutate<T, E, F>(&self, key: RoomKey, mut op: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnMut(&mut RoomTx<'_>) -> Result<T, E>,
    {
        let attempts = self.config.max_tx_retries.max(1);
        for attempt in 0..attempts {
            // Snapshot under the read lock, then release it while the
            // closure runs; the version stamp catches anyone who
            // commits in the gap.
            let (room, dice, version) = {
                let inner = self.inner.read().await;
                let Some(slot) = inner.rooms.get(&key) else {
                    return Err(StoreError::RoomNotFound(key).into());
                };
                (slot.room.clone(), slot.dice.clone(), slot.version)
            };
            let mut tx = RoomTx {
                room_key: key,
                room,
                dice,
                die_ids: &self.next_die_id,
            };
            let out = op(&mut tx)?;

            let mut inner = self.inner.write().await;
            let Some(slot) = inner.rooms.get_mut(&key) else {
                return Err(StoreError::RoomNotFound(key).into());
            };
            if slot.version == version {
                slot.room = tx.room;
                slot.dice = tx.dice;
                slot.version += 1;
                return Ok(out);
            }
            drop(inner);
            tracing::debug!(room = %key, attempt, "commit conflict, retrying transaction");
        }
        tracing::warn!(room = %key, attempts, "transaction retries exhausted");
        Err(StoreError::Conflict {
            room: key,
            attempts,
        }
        .into())
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

// ---------------------------------------------------------------------------
// RoomTx
// ---------------------------------------------------------------------------

/// A transaction's working snapshot of one room and its dice.
///
/// Mutations apply to the snapshot only; nothing is visible to other
/// callers until the enclosing [`RoomStore::mutate`] commits.
pub struct RoomTx<'a> {
    room_key: RoomKey,
    room: Room,
    dice: BTreeMap<u64, Die>,
    die_ids: &'a AtomicU64,
}

impl RoomTx<'_> {
    /// The room aggregate.
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Mutable access to the room aggregate.
    pub fn room_mut(&mut self) -> &mut Room {
        &mut self.room
    }

    /// Allocates a key for a new die in this room.
    pub fn new_die_key(&self) -> DieKey {
        DieKey {
            room: self.room_key,
            id: self.die_ids.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Adds a die to the room.
    pub fn insert_die(&mut self, die: Die) {
        debug_assert_eq!(die.key.room, self.room_key, "die parented to another room");
        self.dice.insert(die.key.id, die);
    }

    /// Looks up a die.
    ///
    /// # Errors
    /// [`StoreError::DieNotFound`] if the key doesn't resolve here.
    pub fn die(&self, key: DieKey) -> Result<&Die, StoreError> {
        self.dice.get(&key.id).ok_or(StoreError::DieNotFound(key))
    }

    /// Looks up a die for mutation.
    pub fn die_mut(&mut self, key: DieKey) -> Result<&mut Die, StoreError> {
        self.dice
            .get_mut(&key.id)
            .ok_or(StoreError::DieNotFound(key))
    }

    /// Removes and returns a die.
    pub fn remove_die(&mut self, key: DieKey) -> Result<Die, StoreError> {
        self.dice
            .remove(&key.id)
            .ok_or(StoreError::DieNotFound(key))
    }

    /// Iterates the room's dice in creation order.
    pub fn dice(&self) -> impl Iterator<Item = &Die> {
        self.dice.values()
    }

    /// Deletes every die in the room; returns how many went.
    pub fn clear_dice(&mut self) -> usize {
        let count = self.dice.len();
        self.dice.clear();
        count
    }

    /// Records an update in the room's journal and advances the room
    /// timestamp. Rides the enclosing transaction.
    pub fn append_update(&mut self, update: Update) {
        self.room.timestamp = update.timestamp;
        self.room.journal.append(update);
    }
}
