//! Deck and draw-pool engines for Felt.
//!
//! Two flavors of "drawable pool" live here:
//!
//! - [`Deck`] — the fixed 52-card playing-card domain, persisted as a
//!   compact string *signature* so a room aggregate can carry its whole
//!   deck state in one field. Deals without replacement; reshuffles the
//!   remainder while cards already on the table stay out.
//! - [`CustomSet`] — a user-authored pool of arbitrary strings (NPC
//!   names, loot tables, prompt decks) with the same
//!   draw/remaining/reshuffle semantics over an open vocabulary.
//!
//! Both are pure in-memory structures. Persistence and transactions are
//! the repository's problem; everything here is a function over values.

mod card;
mod custom;
mod deck;
mod error;

pub use card::{Card, DECK_SIZE};
pub use custom::CustomSet;
pub use deck::Deck;
pub use error::DeckError;
