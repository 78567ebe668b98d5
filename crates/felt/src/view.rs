//! The room snapshot projection.
//!
//! What a polling client actually re-fetches: the room's dice filtered
//! for the viewer, plus the table-level aggregates the page shows.
//! Hidden tokens are the delicate part: a card hidden by someone else
//! still occupies its spot on the table, shown face-down; every other
//! hidden kind simply isn't there for strangers.

use felt_room::{Room, RoomAction};
use felt_token::{Die, DieKey, DieKind, Fingerprint};
use serde::Serialize;

use crate::AssetResolver;

/// One die as the viewer is allowed to see it.
#[derive(Debug, Clone, Serialize)]
pub struct DieView {
    pub key: DieKey,
    pub kind: DieKind,
    pub result: i32,
    /// Display form; blanked for cards masked face-down.
    pub display: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    /// Freshly created, not yet settled by a move.
    pub fresh: bool,
    /// True only when the viewer owns the hidden die; strangers never
    /// learn a masked card is "hidden", it just looks face-down.
    pub hidden: bool,
    /// Resolved display asset, if the kind has one.
    pub image: Option<String>,
}

/// A custom set's table summary.
#[derive(Debug, Clone, Serialize)]
pub struct CustomSetView {
    pub name: String,
    pub remaining: usize,
    pub height: String,
    pub width: String,
}

/// Everything the room page needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    pub slug: String,
    /// Dice visible to this viewer, in display order.
    pub dice: Vec<DieView>,
    /// Total of the most recent roll's numeric dice.
    pub roll_total: i32,
    pub roll_avg: f64,
    /// Total of every numeric die on the table.
    pub room_total: i32,
    pub room_avg: f64,
    /// Sticky room modifier.
    pub modifier: i32,
    pub modified_roll_total: i32,
    /// Cards left in the room deck.
    pub cards_left: usize,
    /// Coin tokens on the table.
    pub token_count: usize,
    pub background_url: Option<String>,
    pub custom_sets: Vec<CustomSetView>,
    /// Timestamp of the most recent die mutation (0 when empty).
    pub last_change: i64,
}

/// Builds the viewer-filtered projection.
///
/// `display_dice` is the stable display ordering; `newest_first` is
/// the same set ordered newest-first, which defines the "most recent
/// roll" group for totals.
pub(crate) fn build_view(
    room: &Room,
    display_dice: &[Die],
    newest_first: &[Die],
    viewer: &Fingerprint,
    assets: &dyn AssetResolver,
    cards_left: usize,
) -> RoomView {
    // Totals aggregate over ALL dice, hidden or not: a hidden card
    // isn't numeric, and a hidden coin still counts as a token.
    let newest_ts = newest_first.first().map(|d| d.timestamp).unwrap_or(0);
    let mut roll_total = 0;
    let mut roll_count = 0;
    let mut room_total = 0;
    let mut room_count = 0;
    let mut token_count = 0;
    for die in newest_first {
        if die.kind.counts_toward_total() {
            room_total += die.result;
            room_count += 1;
            if die.timestamp == newest_ts {
                roll_total += die.result;
                roll_count += 1;
            }
        }
        if die.kind == DieKind::Coin {
            token_count += 1;
        }
    }

    // After a delete, the page keeps showing the pre-delete roll total
    // instead of recomputing it from the survivors.
    if room.last_action == Some(RoomAction::Delete) {
        roll_total = room.last_roll;
    }

    let dice: Vec<DieView> = display_dice
        .iter()
        .filter_map(|die| project_die(die, viewer, assets))
        .collect();

    let last_change = display_dice.iter().map(|d| d.timestamp).max().unwrap_or(0);

    RoomView {
        slug: room.slug.clone(),
        dice,
        roll_total,
        roll_avg: avg(roll_total, roll_count),
        room_total,
        room_avg: avg(room_total, room_count),
        modifier: room.modifier,
        modified_roll_total: roll_total + room.modifier,
        cards_left,
        token_count,
        background_url: room.background_url.clone(),
        custom_sets: room
            .custom_sets
            .iter()
            .map(|(name, set)| CustomSetView {
                name: name.clone(),
                remaining: set.remaining(),
                height: set.max_height.clone(),
                width: set.max_width.clone(),
            })
            .collect(),
        last_change,
    }
}

/// Projects one die for a viewer, or filters it out entirely.
fn project_die(die: &Die, viewer: &Fingerprint, assets: &dyn AssetResolver) -> Option<DieView> {
    let owned = die.hidden_by().is_some_and(|by| by == viewer);
    if !die.hidden() || owned {
        return Some(DieView {
            key: die.key,
            kind: die.kind.clone(),
            result: die.result,
            display: die.display.clone(),
            x: die.x,
            y: die.y,
            color: die.color.clone(),
            fresh: die.fresh,
            hidden: die.hidden(),
            image: assets.resolve(&die.kind, &die.display, &die.color),
        });
    }
    if die.kind == DieKind::Card {
        // Someone else's hidden card: still occupies its position,
        // face-down, with nothing to give the card away.
        return Some(DieView {
            key: die.key,
            kind: die.kind.clone(),
            result: 0,
            display: String::new(),
            x: die.x,
            y: die.y,
            color: die.color.clone(),
            fresh: die.fresh,
            hidden: false,
            image: Some(assets.face_down()),
        });
    }
    None
}

fn avg(total: i32, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        f64::from(total) / count as f64
    }
}

// =========================================================================
// Tests
// =========================================================================
