//! Error types for the deck layer.

/// Errors that can occur while decoding or drawing from a pool.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// The signature does not parse back to a valid card subset:
    /// odd length, non-hex characters, an out-of-domain ordinal, or
    /// a repeated card.
    #[error("invalid deck signature: {0:?}")]
    InvalidSignature(String),

    /// A card ordinal outside the 52-card domain.
    #[error("card ordinal {0} outside the 52-card domain")]
    InvalidCard(u8),

    /// A card display form that names no card in the domain.
    #[error("unrecognized card: {0:?}")]
    UnknownCard(String),

    /// Drawing from a custom pool that was already empty.
    /// Short draws (pool smaller than the request) are NOT this error;
    /// they drain the pool and succeed.
    #[error("custom pool is empty")]
    EmptyPool,
}
