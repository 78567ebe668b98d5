//! Token entities and lifecycle rules for Felt.
//!
//! Every placeable thing in a room (numeric die, fate die, coin,
//! countdown clock, playing card, custom-set item, label, image) is a
//! [`Die`] with a [`DieKind`]. The kind decides what "reroll", "hide",
//! and "reveal" mean, and a client-supplied [`Fingerprint`] gates who
//! may reveal or reroll a hidden token.
//!
//! # Key types
//!
//! - [`DieKind`] — tagged variant per token kind, dispatch point for
//!   every lifecycle rule
//! - [`Die`] — the entity: result, display form, position, visibility
//! - [`Visibility`] — visible, or hidden by a specific fingerprint
//! - [`RoomKey`] / [`DieKey`] — identity; a die belongs to exactly one
//!   room for its whole life

mod die;
mod error;
mod ids;
mod kind;

pub use die::{Die, RerollOptions, Visibility};
pub use error::TokenError;
pub use ids::{DieKey, Fingerprint, RoomKey};
pub use kind::{ClockFace, DieKind, RerollRule, STANDARD_SIDES};
