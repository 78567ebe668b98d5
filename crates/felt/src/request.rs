//! Roll request shapes.

use felt_token::{ClockFace, DieKind};

/// What one group of like dice should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceSpec {
    /// `count` dice of `sides` sides each, any side count.
    Numeric { sides: u32 },
    /// Fate dice.
    Fate,
    /// Coin tokens (created face-down, flipped by reroll).
    Coin,
}

impl DiceSpec {
    /// The kind of die this spec creates.
    pub fn kind(&self) -> DieKind {
        match self {
            Self::Numeric { sides } => DieKind::Numeric { sides: *sides },
            Self::Fate => DieKind::Fate,
            Self::Coin => DieKind::Coin,
        }
    }
}

/// A group of like dice within a roll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceGroup {
    pub spec: DiceSpec,
    pub count: u32,
}

/// Everything one roll action may ask for: dice groups, clocks, a
/// label, cards off the room deck, plus the table-wide knobs that ride
/// along (color, sticky modifier, hidden card draws).
#[derive(Debug, Clone, Default)]
pub struct RollRequest {
    /// Dice groups, e.g. 3d6 + 2dF.
    pub dice: Vec<DiceGroup>,
    /// Clocks to place, one die per entry.
    pub clocks: Vec<ClockFace>,
    /// A free-text label to place.
    pub label: Option<String>,
    /// Cards to deal from the room deck.
    pub cards: u32,
    /// Color for the created dice.
    pub color: String,
    /// New sticky room modifier.
    pub modifier: i32,
    /// Deal the requested cards face-down, owned by the actor.
    pub hidden: bool,
}

impl RollRequest {
    /// Adds `count` numeric dice of `sides` sides.
    pub fn with_numeric(mut self, sides: u32, count: u32) -> Self {
        self.dice.push(DiceGroup {
            spec: DiceSpec::Numeric { sides },
            count,
        });
        self
    }

    /// Adds `count` fate dice.
    pub fn with_fate(mut self, count: u32) -> Self {
        self.dice.push(DiceGroup {
            spec: DiceSpec::Fate,
            count,
        });
        self
    }

    /// Adds `count` coin tokens.
    pub fn with_coins(mut self, count: u32) -> Self {
        self.dice.push(DiceGroup {
            spec: DiceSpec::Coin,
            count,
        });
        self
    }

    /// Adds one clock with the given face.
    pub fn with_clock(mut self, face: ClockFace) -> Self {
        self.clocks.push(face);
        self
    }

    /// Places a text label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Deals `count` cards from the room deck.
    pub fn with_cards(mut self, count: u32) -> Self {
        self.cards = count;
        self
    }

    /// Sets the dice color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Sets the sticky room modifier.
    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    /// Deals the requested cards face-down.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}
