//! Asset resolution interfaces.
//!
//! The engine never renders anything. It maps each token's semantic
//! identity to a displayable reference and lets the excluded display
//! subsystem do the pixels. Two seams:
//!
//! - [`AssetResolver`] — `(kind, result, color)` → URL. The same
//!   triple recurs constantly, so implementations should memoize;
//!   [`UrlSynthesizer`] is the default, cache included.
//! - [`FaceRenderer`] — procedural face artwork (recolored vector
//!   faces) for dice that aren't served as static images. The engine
//!   only defines the contract and the cache wrapper; a renderer is
//!   supplied by the host.
//!
//! Resolution failure is never fatal: a token with no resolvable asset
//! degrades to a missing-image state, logged and moved past.

use std::collections::HashMap;
use std::sync::Mutex;

use felt_deck::Card;
use felt_token::DieKind;

/// Maps a token's semantic identity to a displayable reference.
pub trait AssetResolver: Send + Sync {
    /// Resolves a display reference for a die. `display` is the die's
    /// kind-dependent display form (`"4"`, `"A♠"`, `"+"`, a custom
    /// item's value). `None` means "no asset": either the kind
    /// renders as text, or resolution degraded.
    fn resolve(&self, kind: &DieKind, display: &str, color: &str) -> Option<String>;

    /// The generic face-down stand-in shown for cards hidden by
    /// someone else.
    fn face_down(&self) -> String;
}

/// Produces face artwork for procedurally-rendered dice.
pub trait FaceRenderer: Send + Sync {
    /// Renders the face for `(shape, result, color)`, e.g.
    /// `("d20", "17", "red")`. `None` on failure; callers degrade.
    fn render(&self, shape: &str, result: &str, color: &str) -> Option<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// UrlSynthesizer
// ---------------------------------------------------------------------------

/// The default resolver: synthesizes storage URLs from a base and
/// memoizes every hit, since the same (kind, result, color) triple
/// recurs on every snapshot of every room.
pub struct UrlSynthesizer {
    base: String,
    cache: Mutex<HashMap<String, String>>,
}

impl UrlSynthesizer {
    /// Creates a synthesizer rooted at `base` (no trailing slash).
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &str) -> Option<String> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, url: String) -> String {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, url.clone());
        }
        url
    }

    fn synthesize(&self, kind: &DieKind, display: &str, color: &str) -> Option<String> {
        match kind {
            DieKind::Card => {
                let file = card_file_name(display)?;
                Some(format!("{}/playing_cards/{file}", self.base))
            }
            DieKind::Numeric { sides } => {
                if !kind.is_standard_numeric() {
                    // Offbeat sizes have no artwork; they render as text.
                    return None;
                }
                Some(format!(
                    "{}/die_images/{color}-d{sides}/{display}.png",
                    self.base
                ))
            }
            DieKind::Fate => {
                let face = match display {
                    "-" => "minus",
                    "+" => "plus",
                    _ => "zero",
                };
                Some(format!("{}/die_images/{color}-dF/{face}.png", self.base))
            }
            DieKind::Coin => Some(format!("{}/tokens/{color}_token.png", self.base)),
            DieKind::Clock { face } => Some(format!(
                "{}/die_images/clocks/{face}-{display}.png",
                self.base
            )),
            // A custom item's value IS its reference (usually an image
            // URL); an image token carries its own.
            DieKind::CustomItem { .. } => Some(display.to_string()),
            DieKind::Image { url, .. } => Some(url.clone()),
            DieKind::Label => None,
        }
    }
}

impl AssetResolver for UrlSynthesizer {
    fn resolve(&self, kind: &DieKind, display: &str, color: &str) -> Option<String> {
        let key = format!("{kind}|{display}|{color}");
        if let Some(hit) = self.cached(&key) {
            return Some(hit);
        }
        match self.synthesize(kind, display, color) {
            Some(url) => Some(self.remember(key, url)),
            None => {
                if matches!(kind, DieKind::Card) {
                    let disp = display;
                    tracing::warn!(%kind, display_ref = %disp, "no asset for token, degrading to missing image");
                }
                None
            }
        }
    }

    fn face_down(&self) -> String {
        format!("{}/playing_cards/back.png", self.base)
    }
}

/// Maps a card's display form to its image file name,
/// e.g. `"A♠"` → `"ace_of_spades.png"`.
fn card_file_name(display: &str) -> Option<String> {
    let card = Card::parse(display).ok()?;
    let face = match card.face() {
        'A' => "ace".to_string(),
        'T' => "10".to_string(),
        'J' => "jack".to_string(),
        'Q' => "queen".to_string(),
        'K' => "king".to_string(),
        digit => digit.to_string(),
    };
    let suit = match card.suit() {
        '♣' => "clubs",
        '♦' => "diamonds",
        '♥' => "hearts",
        _ => "spades",
    };
    Some(format!("{face}_of_{suit}.png"))
}

// ---------------------------------------------------------------------------
// CachedFaceRenderer
// ---------------------------------------------------------------------------

/// Wraps any [`FaceRenderer`] with a (shape, result, color) cache, so
/// a face is rendered once and served from memory after.
pub struct CachedFaceRenderer<R> {
    inner: R,
    cache: Mutex<HashMap<String, Vec<u8>>>,
}

impl<R: FaceRenderer> CachedFaceRenderer<R> {
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<R: FaceRenderer> FaceRenderer for CachedFaceRenderer<R> {
    fn render(&self, shape: &str, result: &str, color: &str) -> Option<Vec<u8>> {
        let key = format!("{shape}-{result}-{color}");
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return Some(hit.clone());
            }
        }
        let rendered = self.inner.render(shape, result, color)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, rendered.clone());
        }
        Some(rendered)
    }
}

// =========================================================================
// Tests
// =========================================================================
