//! Error types for the token layer.

use crate::{DieKey, Fingerprint};

/// Errors that can occur during token lifecycle operations.
///
/// Every variant is a typed rejection: the operation applies no
/// mutation and the caller decides how loudly to surface it (for this
/// domain, usually not at all; "nothing happened" is the UX).
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Reroll requested for a kind that has no reroll semantics
    /// (labels and images), or in-place reroll of a card-like kind.
    #[error("die {0} cannot be rerolled")]
    NotRerollable(DieKey),

    /// This kind cannot be hidden or revealed.
    #[error("die {0} cannot be hidden")]
    NotHideable(DieKey),

    /// Hide requested for a die someone already hid.
    #[error("die {0} is already hidden")]
    AlreadyHidden(DieKey),

    /// Reveal or reroll of a hidden die by someone other than its
    /// hider.
    #[error("die {die} was not hidden by {actor}")]
    NotOwner { die: DieKey, actor: Fingerprint },

    /// A clock operation on a non-clock die.
    #[error("die {0} is not a clock")]
    NotAClock(DieKey),
}
