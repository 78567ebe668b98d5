//! The engine: every operation a room's players can perform.
//!
//! Each operation is one transaction against the room aggregate via
//! [`RoomStore::mutate`]; every successful mutation appends an
//! [`Update`] so pollers notice. Operations that must reach the
//! actor's own browser too (draws, deletes, reveals: anything whose
//! result the actor's page doesn't already show) append broadcast
//! updates; the rest attribute the update so the actor isn't nudged by
//! their own click.

use std::collections::BTreeSet;
use std::sync::Arc;

use felt_deck::{Card, Deck};
use felt_journal::{DEFAULT_REFRESH_WINDOW, Update};
use felt_room::{DiceOrder, RoomAction, RoomStore, RoomTx, StoreConfig};
use felt_token::{
    Die, DieKey, DieKind, Fingerprint, RerollOptions, RerollRule, RoomKey, TokenError,
};

use crate::view::build_view;
use crate::{
    AssetResolver, Clock, EngineError, RollRequest, RoomView, SystemClock, UrlSynthesizer,
    generate_slug,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Refresh window Δ: how long journal entries keep nudging
    /// pollers, in clock units.
    pub refresh_window: i64,
    /// Most dice one roll request may create; groups past the cap are
    /// skipped with a warning.
    pub roll_cap: u32,
    /// Base URL for the default asset synthesizer.
    pub asset_base: String,
    /// Repository settings.
    pub store: StoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_window: DEFAULT_REFRESH_WINDOW,
            roll_cap: 500,
            asset_base: "https://storage.felt-table.dev".to_string(),
            store: StoreConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The shared-table engine. One instance serves every room.
///
/// Cheap to share behind an `Arc`; all interior state is the store's.
pub struct Engine {
    store: RoomStore,
    clock: Arc<dyn Clock>,
    assets: Arc<dyn AssetResolver>,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine with the system clock and the default URL
    /// synthesizer.
    pub fn new(config: EngineConfig) -> Self {
        let assets = Arc::new(UrlSynthesizer::new(config.asset_base.clone()));
        Self {
            store: RoomStore::new(config.store.clone()),
            clock: Arc::new(SystemClock),
            assets,
            config,
        }
    }

    /// Replaces the timestamp source (tests, deterministic replay).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the asset resolver.
    pub fn with_assets(mut self, assets: Arc<dyn AssetResolver>) -> Self {
        self.assets = assets;
        self
    }

    /// Direct repository access for embedders.
    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    // -----------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------

    /// Resolves a slug to its room, creating a fresh one on miss.
    /// Returns the key and whether the room was just created; a
    /// created room means the caller's reference was stale and it
    /// should redirect.
    pub async fn ensure_room(&self, slug: &str) -> (RoomKey, bool) {
        self.store.get_or_create(slug, self.clock.now()).await
    }

    /// Creates a room under a freshly generated slug.
    pub async fn new_room(&self) -> (RoomKey, String) {
        // A collision just redraws; the name space makes even one
        // retry rare.
        loop {
            let slug = generate_slug(&mut rand::rng());
            let (key, created) = self.store.get_or_create(&slug, self.clock.now()).await;
            if created {
                return (key, slug);
            }
        }
    }

    // -----------------------------------------------------------------
    // Rolling and drawing
    // -----------------------------------------------------------------

    /// Rolls everything in `request` onto the table and returns the
    /// numeric total. The request's modifier becomes the room's sticky
    /// modifier.
    pub async fn roll(
        &self,
        room: RoomKey,
        request: RollRequest,
        actor: &Fingerprint,
    ) -> Result<i32, EngineError> {
        let now = self.clock.now();
        let cap = self.config.roll_cap;
        self.store
            .mutate::<i32, EngineError, _>(room, |tx| {
                let mut total = 0;
                let mut requested = 0u32;
                for group in &request.dice {
                    requested = requested.saturating_add(group.count);
                    if requested > cap {
                        tracing::warn!(
                            room = %room,
                            cap,
                            "roll request exceeds the dice cap, skipping group"
                        );
                        continue;
                    }
                    for _ in 0..group.count {
                        let mut die = Die::new(tx.new_die_key(), group.spec.kind(), now);
                        die.color = normalize_color(&request.color);
                        if let Some(result) = die.kind.draw_result(&mut rand::rng()) {
                            die.result = result;
                            die.display = die.kind.format_result(result);
                            if die.kind.counts_toward_total() {
                                total += result;
                            }
                        } else {
                            // Coins start face-down; flipping is a reroll.
                            die.result = 0;
                            die.display = "0".to_string();
                        }
                        tx.insert_die(die);
                    }
                }
                for face in &request.clocks {
                    let mut die = Die::new(tx.new_die_key(), DieKind::Clock { face: *face }, now);
                    die.display = "0".to_string();
                    tx.insert_die(die);
                }
                if let Some(label) = &request.label {
                    if !label.trim().is_empty() {
                        let mut die = Die::new(tx.new_die_key(), DieKind::Label, now);
                        die.display = label.trim().to_string();
                        tx.insert_die(die);
                    }
                }
                if request.cards > 0 {
                    self.deal_from_deck(tx, request.cards as usize, request.hidden, actor, now)?;
                }
                let room_mut = tx.room_mut();
                room_mut.modifier = request.modifier;
                room_mut.last_roll = total;
                room_mut.last_action = Some(RoomAction::Roll);
                tx.append_update(Update::attributed(actor.clone(), now));
                Ok(total)
            })
            .await
    }

    /// Deals `count` cards from the room deck, or draws from the named
    /// custom set. Short when the pool runs dry; the caller gets what
    /// was there.
    pub async fn draw_cards(
        &self,
        room: RoomKey,
        count: u32,
        set_name: Option<&str>,
        hidden: bool,
        actor: &Fingerprint,
    ) -> Result<Vec<Die>, EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<Vec<Die>, EngineError, _>(room, |tx| {
                let keys = match set_name {
                    Some(name) => {
                        self.draw_from_set(tx, name, count as usize, hidden, actor, now)?
                    }
                    None => self.deal_from_deck(tx, count as usize, hidden, actor, now)?,
                };
                let mut drawn = Vec::with_capacity(keys.len());
                for key in keys {
                    drawn.push(tx.die(key)?.clone());
                }
                tx.room_mut().last_action = Some(RoomAction::Draw);
                // The actor's own page must re-fetch to show the draw.
                tx.append_update(Update::broadcast_from(actor.clone(), now));
                Ok(drawn)
            })
            .await
    }

    // -----------------------------------------------------------------
    // Token lifecycle
    // -----------------------------------------------------------------

    /// Rerolls one die, whatever that means for its kind: in-place
    /// redraw for dice/coins/clocks, delete-and-redraw for cards and
    /// custom items, a typed rejection for labels and images.
    pub async fn reroll_die(
        &self,
        die_key: DieKey,
        actor: &Fingerprint,
        opts: RerollOptions,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let room = die_key.room;
        let outcome = self
            .store
            .mutate::<(), EngineError, _>(room, |tx| {
                let die = tx.die(die_key)?.clone();
                if die.locked_for(actor) {
                    return Err(TokenError::NotOwner {
                        die: die_key,
                        actor: actor.clone(),
                    }
                    .into());
                }
                match die.kind.reroll_rule() {
                    RerollRule::InPlace => {
                        let rolled = tx.die_mut(die_key)?;
                        rolled.reroll_in_place(&opts, now)?;
                        let counts = rolled.kind.counts_toward_total();
                        let result = rolled.result;
                        let room_mut = tx.room_mut();
                        room_mut.last_roll = if counts { result } else { 0 };
                        room_mut.last_action = Some(RoomAction::Reroll);
                        Ok(())
                    }
                    RerollRule::Redraw => {
                        // The old value must return to (or stay out of)
                        // its finite pool, so the entity is replaced,
                        // not mutated: draw one, put it where the old
                        // one sat, delete the old one.
                        let hidden = die.hidden();
                        let owner = die
                            .hidden_by()
                            .cloned()
                            .unwrap_or_else(Fingerprint::system);
                        let replacements = match &die.kind {
                            DieKind::CustomItem { set, .. } => {
                                self.draw_from_set(tx, set, 1, hidden, &owner, now)?
                            }
                            _ => self.deal_from_deck(tx, 1, hidden, &owner, now)?,
                        };
                        match replacements.first() {
                            Some(new_key) => {
                                let replacement = tx.die_mut(*new_key)?;
                                replacement.x = die.x;
                                replacement.y = die.y;
                                replacement.fresh = false;
                                tx.remove_die(die_key)?;
                            }
                            None => {
                                // Deck ran dry mid-reroll: keep the old
                                // card rather than eating it.
                                tracing::warn!(
                                    die = %die_key,
                                    "no replacement drawn, keeping original"
                                );
                            }
                        }
                        let room_mut = tx.room_mut();
                        room_mut.last_roll = 0;
                        room_mut.last_action = Some(RoomAction::Reroll);
                        Ok(())
                    }
                    RerollRule::Forbidden => Err(TokenError::NotRerollable(die_key).into()),
                }
            })
            .await;

        match &outcome {
            Ok(()) => self.nudge(room, now).await?,
            Err(EngineError::Token(TokenError::NotOwner { .. })) => {
                // Preserved quirk: a rejected unauthorized reroll still
                // nudges every poller, so browsers with flaky refresh
                // re-sync to the unchanged truth.
                if let Err(err) = self.nudge(room, now).await {
                    tracing::debug!(%err, "nudge after rejected reroll failed");
                }
            }
            Err(_) => {}
        }
        outcome
    }

    /// Hides a die, recording the actor as its owner.
    pub async fn hide_die(
        &self,
        die_key: DieKey,
        actor: &Fingerprint,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(die_key.room, |tx| {
                tx.die_mut(die_key)?.hide(actor.clone())?;
                let room_mut = tx.room_mut();
                room_mut.last_roll = 0;
                room_mut.last_action = Some(RoomAction::Hide);
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }

    /// Reveals a die the actor hid (or anyone hid unattributed).
    pub async fn reveal_die(
        &self,
        die_key: DieKey,
        actor: &Fingerprint,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let outcome = self
            .store
            .mutate::<(), EngineError, _>(die_key.room, |tx| {
                tx.die_mut(die_key)?.reveal(actor)?;
                let room_mut = tx.room_mut();
                room_mut.last_roll = 0;
                room_mut.last_action = Some(RoomAction::Reveal);
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await;

        if let Err(EngineError::Token(TokenError::NotOwner { .. })) = &outcome {
            // Same quirk as reroll: the rejection still nudges.
            if let Err(err) = self.nudge(die_key.room, now).await {
                tracing::debug!(%err, "nudge after rejected reveal failed");
            }
        }
        outcome
    }

    /// Moves a die. Unconditional.
    pub async fn move_die(
        &self,
        die_key: DieKey,
        x: f64,
        y: f64,
        actor: &Fingerprint,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(die_key.room, |tx| {
                tx.die_mut(die_key)?.move_to(x, y);
                tx.room_mut().last_action = Some(RoomAction::Move);
                tx.append_update(Update::attributed(actor.clone(), now));
                Ok(())
            })
            .await
    }

    /// Removes one die from the table.
    pub async fn delete_die(&self, die_key: DieKey) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(die_key.room, |tx| {
                tx.remove_die(die_key)?;
                tx.room_mut().last_action = Some(RoomAction::Delete);
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }

    /// Steps a clock down one segment; a clock at 0 stays at 0.
    pub async fn decrement_clock(&self, die_key: DieKey) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(die_key.room, |tx| {
                tx.die_mut(die_key)?.decrement_clock()?;
                tx.room_mut().last_action = Some(RoomAction::DecrementClock);
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }

    /// Clears every die off the table.
    pub async fn clear_room(
        &self,
        room: RoomKey,
        actor: &Fingerprint,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                let cleared = tx.clear_dice();
                tracing::info!(room = %room, cleared, "room cleared");
                tx.room_mut().last_action = Some(RoomAction::Clear);
                tx.append_update(Update::broadcast_from(actor.clone(), now));
                Ok(())
            })
            .await
    }

    /// Places an arbitrary image token.
    pub async fn add_image(
        &self,
        room: RoomKey,
        url: &str,
        height: &str,
        width: &str,
        actor: &Fingerprint,
    ) -> Result<DieKey, EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<DieKey, EngineError, _>(room, |tx| {
                let key = tx.new_die_key();
                let mut die = Die::new(
                    key,
                    DieKind::Image {
                        url: url.to_string(),
                        height: height.to_string(),
                        width: width.to_string(),
                    },
                    now,
                );
                die.display = "image".to_string();
                tx.insert_die(die);
                tx.room_mut().last_action = Some(RoomAction::Image);
                tx.append_update(Update::attributed(actor.clone(), now));
                Ok(key)
            })
            .await
    }

    // -----------------------------------------------------------------
    // Room settings
    // -----------------------------------------------------------------

    /// Sets (or clears, with an empty string) the room backdrop.
    pub async fn set_background(&self, room: RoomKey, url: &str) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                tx.room_mut().background_url = if url.is_empty() {
                    None
                } else {
                    Some(url.to_string())
                };
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }

    /// Adds (or replaces) a custom set parsed from a newline-separated
    /// definition.
    pub async fn add_custom_set(
        &self,
        room: RoomKey,
        name: &str,
        definition: &str,
        height: &str,
        width: &str,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                let set = felt_deck::CustomSet::from_definition(definition, height, width);
                tx.room_mut().custom_sets.insert(name.to_string(), set);
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }

    /// Removes a custom set. Removing a set that isn't there is fine.
    pub async fn remove_custom_set(&self, room: RoomKey, name: &str) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                tx.room_mut().custom_sets.remove(name);
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }

    /// Reshuffles a pool's discards back in. For the room deck
    /// (`set_name` = `None`), cards still on the table stay out; for a
    /// named custom set, that set's still-out items stay out.
    pub async fn shuffle_discards(
        &self,
        room: RoomKey,
        set_name: Option<&str>,
        actor: &Fingerprint,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                match set_name {
                    Some(name) => {
                        let still_out: BTreeSet<String> = tx
                            .dice()
                            .filter_map(|d| match &d.kind {
                                DieKind::CustomItem { set, .. } if set == name => {
                                    Some(d.result.to_string())
                                }
                                _ => None,
                            })
                            .collect();
                        let Some(set) = tx.room_mut().custom_sets.get_mut(name) else {
                            return Err(EngineError::UnknownSet(name.to_string()));
                        };
                        set.shuffle_discards(&still_out);
                    }
                    None => {
                        let still_out: Vec<Card> = tx
                            .dice()
                            .filter(|d| d.kind == DieKind::Card)
                            .filter_map(|d| Card::parse(&d.display).ok())
                            .collect();
                        tx.room_mut().deck_signature =
                            Deck::rebuild_excluding(still_out).signature();
                    }
                }
                tx.room_mut().last_action = Some(RoomAction::Shuffle);
                tx.append_update(Update::broadcast_from(actor.clone(), now));
                Ok(())
            })
            .await
    }

    /// Broadcasts a human-readable message to every poller.
    pub async fn alert(&self, room: RoomKey, message: &str) -> Result<(), EngineError> {
        let now = self.clock.now();
        let message = message.to_string();
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                tx.append_update(Update::alert(message.clone(), now));
                Ok(())
            })
            .await
    }

    // -----------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------

    /// Answers a client's poll: prunes the journal and returns a change
    /// token for everything the requester didn't cause, or `None` when
    /// there's nothing to refresh.
    pub async fn refresh(
        &self,
        room: RoomKey,
        requester: &Fingerprint,
    ) -> Result<Option<String>, EngineError> {
        let now = self.clock.now();
        let window = self.config.refresh_window;
        self.store
            .mutate::<Option<String>, EngineError, _>(room, |tx| {
                Ok(tx.room_mut().journal.refresh(now, requester, window))
            })
            .await
    }

    /// Builds the viewer-filtered room projection.
    pub async fn snapshot(
        &self,
        room: RoomKey,
        viewer: &Fingerprint,
    ) -> Result<RoomView, EngineError> {
        let aggregate = self.store.room(room).await?;
        let cards_left = Deck::from_signature(&aggregate.deck_signature)?.remaining();
        let display = self.store.dice(room, DiceOrder::ByResult).await?;
        let newest = self.store.dice(room, DiceOrder::NewestFirst).await?;
        Ok(build_view(
            &aggregate,
            &display,
            &newest,
            viewer,
            self.assets.as_ref(),
            cards_left,
        ))
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Deals from the room's deck signature into card dice.
    fn deal_from_deck(
        &self,
        tx: &mut RoomTx<'_>,
        count: usize,
        hidden: bool,
        owner: &Fingerprint,
        now: i64,
    ) -> Result<Vec<DieKey>, EngineError> {
        let mut deck = Deck::from_signature(&tx.room().deck_signature)?;
        let hand = deck.deal(count);
        let mut keys = Vec::with_capacity(hand.len());
        for card in hand {
            let key = tx.new_die_key();
            let mut die = Die::new(key, DieKind::Card, now);
            die.display = card.to_string();
            if hidden {
                die.hide(owner.clone())?;
            }
            tx.insert_die(die);
            keys.push(key);
        }
        tx.room_mut().deck_signature = deck.signature();
        Ok(keys)
    }

    /// Draws from a named custom set into custom-item dice.
    fn draw_from_set(
        &self,
        tx: &mut RoomTx<'_>,
        set_name: &str,
        count: usize,
        hidden: bool,
        owner: &Fingerprint,
        now: i64,
    ) -> Result<Vec<DieKey>, EngineError> {
        let Some(set) = tx.room_mut().custom_sets.get_mut(set_name) else {
            return Err(EngineError::UnknownSet(set_name.to_string()));
        };
        let height = set.max_height.clone();
        let width = set.max_width.clone();
        let drawn = set.draw(count)?;

        let mut keys = Vec::with_capacity(drawn.len());
        for (item_key, value) in drawn {
            let key = tx.new_die_key();
            let mut die = Die::new(
                key,
                DieKind::CustomItem {
                    set: set_name.to_string(),
                    height: height.clone(),
                    width: width.clone(),
                },
                now,
            );
            // The item's template key doubles as its result, so a
            // later shuffle knows which items are still out.
            die.result = item_key.parse().unwrap_or(0);
            die.display = value;
            if hidden {
                die.hide(owner.clone())?;
            }
            tx.insert_die(die);
            keys.push(key);
        }
        Ok(keys)
    }

    /// Appends a standalone broadcast update so every poller re-syncs.
    async fn nudge(&self, room: RoomKey, now: i64) -> Result<(), EngineError> {
        self.store
            .mutate::<(), EngineError, _>(room, |tx| {
                tx.append_update(Update::broadcast(now));
                Ok(())
            })
            .await
    }
}

/// The "clear" color renders as light blue on every surface.
fn normalize_color(color: &str) -> String {
    if color == "clear" {
        "lightblue".to_string()
    } else {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_color_maps_clear_to_lightblue() {
        assert_eq!(normalize_color("clear"), "lightblue");
        assert_eq!(normalize_color("red"), "red");
        assert_eq!(normalize_color(""), "");
    }
}
