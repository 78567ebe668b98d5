//! The fixed 52-card domain.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DeckError;

/// Number of cards in the full domain.
pub const DECK_SIZE: usize = 52;

/// Face characters in rank order. `T` is ten, so single characters keep
/// the display form exactly two characters wide.
const FACES: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

/// Suit characters in domain order.
const SUITS: [char; 4] = ['♣', '♦', '♥', '♠'];

/// A single playing card, stored as its ordinal in the 52-card domain.
///
/// The ordinal layout is `face * 4 + suit`, so `A♣` is 0, `A♦` is 1,
/// and `K♠` is 51. A `Card` can only be constructed through
/// [`Card::from_ordinal`] or [`Card::parse`], both of which reject
/// anything outside the domain, so holding a `Card` means holding a
/// valid one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Card(u8);

impl Card {
    /// Builds a card from its domain ordinal.
    ///
    /// # Errors
    /// Returns [`DeckError::InvalidCard`] if `ordinal >= 52`.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, DeckError> {
        if usize::from(ordinal) >= DECK_SIZE {
            return Err(DeckError::InvalidCard(ordinal));
        }
        Ok(Self(ordinal))
    }

    /// Returns the card's domain ordinal (0..52).
    pub fn ordinal(self) -> u8 {
        self.0
    }

    /// Returns the face character (`A`, `2`..`9`, `T`, `J`, `Q`, `K`).
    pub fn face(self) -> char {
        FACES[usize::from(self.0) / 4]
    }

    /// Returns the suit character (`♣`, `♦`, `♥`, `♠`).
    pub fn suit(self) -> char {
        SUITS[usize::from(self.0) % 4]
    }

    /// Parses the two-character display form, e.g. `"A♠"` or `"T♦"`.
    ///
    /// # Errors
    /// Returns [`DeckError::UnknownCard`] if the string is not exactly
    /// a known face followed by a known suit.
    pub fn parse(s: &str) -> Result<Self, DeckError> {
        let mut chars = s.chars();
        let (Some(f), Some(u), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(DeckError::UnknownCard(s.to_string()));
        };
        let face = FACES
            .iter()
            .position(|c| *c == f)
            .ok_or_else(|| DeckError::UnknownCard(s.to_string()))?;
        let suit = SUITS
            .iter()
            .position(|c| *c == u)
            .ok_or_else(|| DeckError::UnknownCard(s.to_string()))?;
        Ok(Self((face * 4 + suit) as u8))
    }

    /// Iterates the full domain in ordinal order.
    pub fn all() -> impl Iterator<Item = Card> {
        (0..DECK_SIZE as u8).map(Card)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face(), self.suit())
    }
}
