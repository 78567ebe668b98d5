//! The signature-encoded deck.

use rand::seq::SliceRandom;

use crate::{Card, DECK_SIZE, DeckError};

/// An ordered deck of remaining cards. Index 0 is the top.
///
/// A deck's whole state serializes to a *signature*: two lowercase hex
/// digits per card, top first. `"00"` is a deck holding only `A♣`;
/// the empty string is a valid empty deck. Encoding the deck as one
/// short string lets the room aggregate stay self-contained: no deck
/// table, no extra reads, and deal/reshuffle become pure functions
/// over a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds the full 52-card domain in a uniformly random order.
    pub fn new_shuffled() -> Self {
        let mut cards: Vec<Card> = Card::all().collect();
        cards.shuffle(&mut rand::rng());
        Self { cards }
    }

    /// An empty deck (nothing left to deal).
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    /// Reconstructs a deck from its signature.
    ///
    /// # Errors
    /// Returns [`DeckError::InvalidSignature`] if the signature has odd
    /// length, contains non-hex characters, names an ordinal outside
    /// the domain, or repeats a card.
    pub fn from_signature(signature: &str) -> Result<Self, DeckError> {
        if signature.len() % 2 != 0 {
            return Err(DeckError::InvalidSignature(signature.to_string()));
        }
        let bytes = signature.as_bytes();
        let mut cards = Vec::with_capacity(signature.len() / 2);
        let mut seen = [false; DECK_SIZE];
        for pair in bytes.chunks_exact(2) {
            let hi = hex_digit(pair[0]);
            let lo = hex_digit(pair[1]);
            let (Some(hi), Some(lo)) = (hi, lo) else {
                return Err(DeckError::InvalidSignature(signature.to_string()));
            };
            let ordinal = hi * 16 + lo;
            let card = Card::from_ordinal(ordinal)
                .map_err(|_| DeckError::InvalidSignature(signature.to_string()))?;
            if seen[usize::from(ordinal)] {
                return Err(DeckError::InvalidSignature(signature.to_string()));
            }
            seen[usize::from(ordinal)] = true;
            cards.push(card);
        }
        Ok(Self { cards })
    }

    /// Serializes the deck to its signature.
    pub fn signature(&self) -> String {
        let mut out = String::with_capacity(self.cards.len() * 2);
        for card in &self.cards {
            out.push_str(&format!("{:02x}", card.ordinal()));
        }
        out
    }

    /// Number of cards left in the deck.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Removes up to `count` cards from the top and returns them.
    ///
    /// Asking for more cards than remain is a *short deal*, not an
    /// error: everything left is dealt and a warning is logged. Callers
    /// decide whether a short hand matters.
    pub fn deal(&mut self, count: usize) -> Vec<Card> {
        if count > self.cards.len() {
            tracing::warn!(
                requested = count,
                remaining = self.cards.len(),
                "short deal: fewer cards remain than requested"
            );
        }
        let take = count.min(self.cards.len());
        self.cards.drain(..take).collect()
    }

    /// Builds a fresh shuffled deck of the full domain minus `excluded`.
    ///
    /// This is "shuffle the discards": cards still out on the table
    /// stay out, everything else becomes drawable again in a new
    /// random order.
    pub fn rebuild_excluding<I>(excluded: I) -> Self
    where
        I: IntoIterator<Item = Card>,
    {
        let mut out = [false; DECK_SIZE];
        for card in excluded {
            out[usize::from(card.ordinal())] = true;
        }
        let mut cards: Vec<Card> = Card::all()
            .filter(|c| !out[usize::from(c.ordinal())])
            .collect();
        cards.shuffle(&mut rand::rng());
        Self { cards }
    }

    /// Returns the remaining cards, top first.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
