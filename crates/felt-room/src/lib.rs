//! Room aggregate and repository for Felt.
//!
//! A [`Room`] owns everything that makes a shared table a table: the
//! deck signature, the custom sets, the sticky roll modifier, and the
//! update journal. Its child [`Die`](felt_token::Die) entities live
//! beside it in the [`RoomStore`], scoped by their parent key.
//!
//! All multi-step mutations run through [`RoomStore::mutate`]: a
//! snapshot-isolated read-modify-write with transparent bounded retry,
//! so two players rolling at the same instant never corrupt the deck
//! signature or double-count cards; that is the common case here, not
//! an edge case.

mod error;
mod room;
mod store;

pub use error::StoreError;
pub use room::{Room, RoomAction};
pub use store::{DiceOrder, RoomStore, RoomTx, StoreConfig};
