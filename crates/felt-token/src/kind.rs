//! Token kinds and the rules that hang off them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Die sizes with dedicated face artwork. Anything else is an
/// "offbeat" die: still rollable, but displayed as text (`"7 (d13)"`)
/// because no face asset exists for it.
pub const STANDARD_SIDES: [u32; 14] = [3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 20, 24, 30, 100];

/// The face layout of a countdown clock token.
///
/// A clock with N segments has N+1 display states (empty through
/// full), so a 4-segment clock cycles through 5 results. `Ct` is the
/// generic tracker clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockFace {
    C4,
    C6,
    C8,
    Ct,
}

impl ClockFace {
    /// Number of distinct result states; results cycle in
    /// `0..period()`.
    pub fn period(self) -> i32 {
        match self {
            Self::C4 => 5,
            Self::C6 => 7,
            Self::C8 => 9,
            Self::Ct => 7,
        }
    }
}

impl fmt::Display for ClockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C4 => write!(f, "c4"),
            Self::C6 => write!(f, "c6"),
            Self::C8 => write!(f, "c8"),
            Self::Ct => write!(f, "ct"),
        }
    }
}

/// What rerolling a die of some kind actually does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerollRule {
    /// Redraw the result in place (numeric, fate, coin, clock).
    InPlace,
    /// Delete the die and draw a replacement from its pool: the old
    /// value must go back to (or stay out of) a finite pool, so the
    /// entity cannot simply be mutated (card, custom item).
    Redraw,
    /// Reroll is meaningless (label, image).
    Forbidden,
}

/// The kind of a placeable token. Fixed at creation for the die's
/// whole life; every lifecycle rule dispatches on this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DieKind {
    /// A numeric die with the given side count; rolls uniform in
    /// `[1, sides]`.
    Numeric { sides: u32 },
    /// A fate die: minus, blank, or plus.
    Fate,
    /// A two-state coin token.
    Coin,
    /// A countdown clock.
    Clock { face: ClockFace },
    /// A playing card dealt from the room deck.
    Card,
    /// An item drawn from a named custom set.
    CustomItem {
        set: String,
        height: String,
        width: String,
    },
    /// A free-text label.
    Label,
    /// An arbitrary image placed on the table.
    Image {
        url: String,
        height: String,
        width: String,
    },
}

impl DieKind {
    /// Returns `true` for numeric sizes with dedicated face artwork.
    pub fn is_standard_numeric(&self) -> bool {
        matches!(self, Self::Numeric { sides } if STANDARD_SIDES.contains(sides))
    }

    /// Returns `true` if this kind may be hidden and revealed.
    pub fn hideable(&self) -> bool {
        matches!(
            self,
            Self::Card | Self::CustomItem { .. } | Self::Clock { .. } | Self::Coin | Self::Image { .. }
        )
    }

    /// How a reroll of this kind behaves.
    pub fn reroll_rule(&self) -> RerollRule {
        match self {
            Self::Numeric { .. } | Self::Fate | Self::Coin | Self::Clock { .. } => {
                RerollRule::InPlace
            }
            Self::Card | Self::CustomItem { .. } => RerollRule::Redraw,
            Self::Label | Self::Image { .. } => RerollRule::Forbidden,
        }
    }

    /// Returns `true` if this kind's results accumulate into roll and
    /// room totals. Only numeric dice count; fate symbols and coin
    /// faces aren't quantities.
    pub fn counts_toward_total(&self) -> bool {
        matches!(self, Self::Numeric { .. })
    }
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric { sides } => write!(f, "d{sides}"),
            Self::Fate => write!(f, "dF"),
            Self::Coin => write!(f, "token"),
            Self::Clock { face } => write!(f, "{face}"),
            Self::Card => write!(f, "card"),
            Self::CustomItem { set, .. } => write!(f, "custom:{set}"),
            Self::Label => write!(f, "label"),
            Self::Image { .. } => write!(f, "image"),
        }
    }
}
