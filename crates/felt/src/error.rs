//! Error type for the engine surface.

use felt_deck::DeckError;
use felt_room::StoreError;
use felt_token::TokenError;

/// Anything an engine operation can fail with.
///
/// The taxonomy, in caller terms:
/// - not-found → [`StoreError`] (self-healing for rooms via
///   `get_or_create`; fatal to the single operation for dice)
/// - invalid state → [`TokenError`] / [`DeckError::EmptyPool`] /
///   [`EngineError::UnknownSet`] (rejected, nothing mutated)
/// - conflict → [`StoreError::Conflict`] (already retried internally)
///
/// Short deals and short draws are deliberately NOT here; they
/// degrade and log instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Deck or custom-pool failure.
    #[error(transparent)]
    Deck(#[from] DeckError),

    /// Token lifecycle rejection.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Repository failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A draw or shuffle named a custom set the room doesn't have.
    #[error("no custom set named {0:?}")]
    UnknownSet(String),
}
