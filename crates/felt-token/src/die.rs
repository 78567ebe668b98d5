//! The `Die` entity and its lifecycle operations.
//!
//! A die is created by a roll/draw/add-image action, mutated in place
//! by move/reroll/hide/reveal, and destroyed by delete or clear. The
//! one exception is card-like kinds: their reroll is delete-and-redraw,
//! orchestrated a layer up where the draw pools live.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DieKey, DieKind, Fingerprint, TokenError};

/// Whether a die is visible to everyone or hidden by someone.
///
/// Hiding always records *who* hid the die, so "hidden but owned by
/// nobody" is unrepresentable, except the deliberate legacy case of a
/// system (empty) fingerprint, which any actor may reveal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden { by: Fingerprint },
}

/// Options carried by a reroll request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RerollOptions {
    /// Coin variant: instead of flipping the face, swap the coin to
    /// white (remembering its color) or back again.
    pub white_flip: bool,
}

/// A placeable token in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Die {
    /// Identity; embeds the parent room and never changes.
    pub key: DieKey,
    /// What this token is. Fixed at creation.
    pub kind: DieKind,
    /// Numeric result. Meaning depends on kind: rolled value, coin
    /// face (0/1), clock state, custom-item key index, 0 otherwise.
    pub result: i32,
    /// Kind-dependent display form: `"4"`, `"7 (d13)"`, `"+"`, `"A♠"`,
    /// a custom item's value, or a label's text.
    pub display: String,
    /// Table position.
    pub x: f64,
    /// Table position.
    pub y: f64,
    /// Die color name (empty for kinds without one).
    pub color: String,
    /// The color a white-flipped coin will return to.
    pub old_color: Option<String>,
    /// Last-mutation time; dice sharing a roll's timestamp group as
    /// one logical roll for totals.
    pub timestamp: i64,
    /// Display hint: freshly created, not yet settled into place.
    /// Cleared by the first move.
    pub fresh: bool,
    /// Visible, or hidden by a fingerprint.
    pub visibility: Visibility,
}

impl Die {
    /// Creates a visible, fresh die at the table origin.
    pub fn new(key: DieKey, kind: DieKind, timestamp: i64) -> Self {
        Self {
            key,
            kind,
            result: 0,
            display: String::new(),
            x: 0.0,
            y: 0.0,
            color: String::new(),
            old_color: None,
            timestamp,
            fresh: true,
            visibility: Visibility::Visible,
        }
    }

    /// Returns `true` if the die is hidden.
    pub fn hidden(&self) -> bool {
        matches!(self.visibility, Visibility::Hidden { .. })
    }

    /// The fingerprint that hid this die, if it is hidden.
    pub fn hidden_by(&self) -> Option<&Fingerprint> {
        match &self.visibility {
            Visibility::Hidden { by } => Some(by),
            Visibility::Visible => None,
        }
    }

    /// Returns `true` if a hidden die blocks this actor from
    /// rerolling it. Only the hider (or the system actor) may
    /// reroll a hidden die. Visible dice block nobody.
    pub fn locked_for(&self, actor: &Fingerprint) -> bool {
        match &self.visibility {
            Visibility::Hidden { by } => by != actor && !actor.is_system(),
            Visibility::Visible => false,
        }
    }

    /// Moves the die. Unconditional; settles the `fresh` flag.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.fresh = false;
    }

    /// Hides the die, recording who hid it.
    ///
    /// # Errors
    /// - [`TokenError::NotHideable`] for kinds that can't be hidden
    /// - [`TokenError::AlreadyHidden`] if someone already hid it
    ///   (a legacy unattributed hide may be re-claimed)
    pub fn hide(&mut self, by: Fingerprint) -> Result<(), TokenError> {
        if !self.kind.hideable() {
            return Err(TokenError::NotHideable(self.key));
        }
        if let Visibility::Hidden { by: owner } = &self.visibility {
            if !owner.is_system() {
                return Err(TokenError::AlreadyHidden(self.key));
            }
        }
        self.visibility = Visibility::Hidden { by };
        Ok(())
    }

    /// Reveals the die. Revealing an already-visible die is a no-op.
    ///
    /// # Errors
    /// - [`TokenError::NotHideable`] for kinds that can't be hidden
    /// - [`TokenError::NotOwner`] unless `by` matches the recorded
    ///   hider, the recorded hider is the system actor (legacy hides),
    ///   or `by` is the system actor
    pub fn reveal(&mut self, by: &Fingerprint) -> Result<(), TokenError> {
        if !self.kind.hideable() {
            return Err(TokenError::NotHideable(self.key));
        }
        if let Visibility::Hidden { by: owner } = &self.visibility {
            if !owner.is_system() && owner != by && !by.is_system() {
                return Err(TokenError::NotOwner {
                    die: self.key,
                    actor: by.clone(),
                });
            }
        }
        self.visibility = Visibility::Visible;
        Ok(())
    }

    /// Rerolls the die in place.
    ///
    /// Only kinds whose [`RerollRule`](crate::RerollRule) is `InPlace`
    /// can be handled here; card-like kinds need their draw pool and
    /// are redrawn by the engine instead.
    ///
    /// # Errors
    /// Returns [`TokenError::NotRerollable`] for every other kind.
    pub fn reroll_in_place(
        &mut self,
        opts: &RerollOptions,
        now: i64,
    ) -> Result<(), TokenError> {
        match &self.kind {
            DieKind::Numeric { sides } => {
                let sides = *sides;
                let result = rand::rng().random_range(1..=sides as i32);
                self.result = result;
                self.display = self.kind.format_result(result);
                self.timestamp = now;
                Ok(())
            }
            DieKind::Fate => {
                let result = rand::rng().random_range(1..=3);
                self.result = result;
                self.display = self.kind.format_result(result);
                self.timestamp = now;
                Ok(())
            }
            DieKind::Coin => {
                self.flip_coin(opts.white_flip);
                self.timestamp = now;
                Ok(())
            }
            DieKind::Clock { face } => {
                // Advancing wraps; the clock keeps its timestamp so it
                // never drags the "most recent roll" grouping around.
                self.result = (self.result + 1) % face.period();
                self.display = self.result.to_string();
                Ok(())
            }
            DieKind::Card | DieKind::CustomItem { .. } | DieKind::Label | DieKind::Image { .. } => {
                Err(TokenError::NotRerollable(self.key))
            }
        }
    }

    /// Steps a clock down one state. Explicitly does NOT wrap below
    /// zero; a clock at 0 stays at 0.
    ///
    /// # Errors
    /// Returns [`TokenError::NotAClock`] for non-clock kinds.
    pub fn decrement_clock(&mut self) -> Result<(), TokenError> {
        if !matches!(self.kind, DieKind::Clock { .. }) {
            return Err(TokenError::NotAClock(self.key));
        }
        if self.result > 0 {
            self.result -= 1;
            self.display = self.result.to_string();
        }
        Ok(())
    }

    fn flip_coin(&mut self, white: bool) {
        self.result = if self.result == 0 { 1 } else { 0 };
        if white {
            // A white flip always lands face-down and toggles the coin
            // between white and its remembered color.
            self.result = 0;
            match self.old_color.take() {
                Some(prior) => self.color = prior,
                None => {
                    self.old_color =
                        Some(std::mem::replace(&mut self.color, "white".to_string()));
                }
            }
        }
        self.display = self.result.to_string();
    }
}

impl DieKind {
    /// Draws a fresh random result for kinds that roll (numeric and
    /// fate). Returns `None` for everything else.
    pub fn draw_result(&self, rng: &mut impl Rng) -> Option<i32> {
        match self {
            Self::Numeric { sides } => Some(rng.random_range(1..=*sides as i32)),
            Self::Fate => Some(rng.random_range(1..=3)),
            _ => None,
        }
    }

    /// Formats a result the way this kind displays it.
    pub fn format_result(&self, result: i32) -> String {
        match self {
            Self::Numeric { sides } => {
                if self.is_standard_numeric() {
                    result.to_string()
                } else {
                    format!("{result} (d{sides})")
                }
            }
            Self::Fate => match result {
                1 => "-".to_string(),
                3 => "+".to_string(),
                _ => " ".to_string(),
            },
            _ => result.to_string(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
