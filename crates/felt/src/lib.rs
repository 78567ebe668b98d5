//! # Felt
//!
//! Shared tabletop session state engine.
//!
//! Any number of browsers point at the same named *room* and roll,
//! draw, hide, move, and reroll shared tokens (dice, playing cards,
//! custom item decks, countdown clocks, labels, images) without a
//! persistent connection. Clients poll [`Engine::refresh`] about once
//! a second and re-fetch the room when the change token moves.
//!
//! ```rust,no_run
//! use felt::prelude::*;
//!
//! # async fn demo() -> Result<(), EngineError> {
//! let engine = Engine::new(EngineConfig::default());
//! let (room, slug) = engine.new_room().await;
//!
//! let alice = Fingerprint::new("alice-browser");
//! let total = engine
//!     .roll(room, RollRequest::default().with_numeric(6, 3), &alice)
//!     .await?;
//! println!("{slug}: rolled {total}");
//! # Ok(())
//! # }
//! ```
//!
//! The HTTP layer, templates, and asset rendering live elsewhere and
//! talk to this crate through [`Engine`], [`AssetResolver`],
//! [`FaceRenderer`], and [`Clock`].

mod assets;
mod clock;
mod engine;
mod error;
mod names;
mod request;
mod view;

pub use assets::{AssetResolver, CachedFaceRenderer, FaceRenderer, UrlSynthesizer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Engine, EngineConfig};
pub use error::EngineError;
pub use names::generate_slug;
pub use request::{DiceGroup, DiceSpec, RollRequest};
pub use view::{CustomSetView, DieView, RoomView};

/// The usual imports for embedding the engine.
pub mod prelude {
    pub use crate::{
        AssetResolver, Clock, Engine, EngineConfig, EngineError, ManualClock, RollRequest,
        RoomView, SystemClock,
    };
    pub use felt_deck::{Card, CustomSet, Deck, DeckError};
    pub use felt_journal::{Journal, Update};
    pub use felt_room::{DiceOrder, Room, RoomStore, StoreError};
    pub use felt_token::{
        ClockFace, Die, DieKey, DieKind, Fingerprint, RerollOptions, RoomKey, TokenError,
        Visibility,
    };
}

/// Installs a process-wide tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
