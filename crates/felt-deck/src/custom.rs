//! User-authored draw pools.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::DeckError;

/// A user-defined pool of arbitrary string "cards".
///
/// Two maps, keyed by the entry's decimal index in the original
/// definition:
///
/// - `template` — the immutable full pool, fixed at creation;
/// - `instance` — the currently-undrawn subset, shrinking on draw and
///   restored by [`CustomSet::shuffle_discards`].
///
/// Invariant: `instance` keys are always a subset of `template` keys.
/// Keys are stable across the set's lifetime, so an item out on the
/// table can be identified by key when the remainder reshuffles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSet {
    template: BTreeMap<String, String>,
    instance: BTreeMap<String, String>,
    /// Display height hint for drawn items (opaque, e.g. "140").
    pub max_height: String,
    /// Display width hint for drawn items.
    pub max_width: String,
}

impl CustomSet {
    /// Parses a newline-separated definition into a fresh set.
    ///
    /// Lines are trimmed; blank lines are dropped; a single-entry
    /// definition (no newline at all) works. Template and instance
    /// start out identical.
    pub fn from_definition(text: &str, height: &str, width: &str) -> Self {
        let mut template = BTreeMap::new();
        let mut index = 0usize;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            template.insert(index.to_string(), line.to_string());
            index += 1;
        }
        Self {
            instance: template.clone(),
            template,
            max_height: height.to_string(),
            max_width: width.to_string(),
        }
    }

    /// Draws up to `count` distinct items from the undrawn pool.
    ///
    /// Selection is a uniform permutation of the remaining keys,
    /// take-first-`count`. Asking for more than remain drains the pool
    /// (a short draw, logged but not an error); the deck engine short
    /// deals the same way, and the two should feel alike.
    ///
    /// # Errors
    /// Returns [`DeckError::EmptyPool`] only when the pool is already
    /// empty before the draw.
    pub fn draw(&mut self, count: usize) -> Result<BTreeMap<String, String>, DeckError> {
        if self.instance.is_empty() {
            return Err(DeckError::EmptyPool);
        }
        if count > self.instance.len() {
            tracing::warn!(
                requested = count,
                remaining = self.instance.len(),
                "short draw: custom pool has fewer items than requested"
            );
        }
        let mut keys: Vec<String> = self.instance.keys().cloned().collect();
        keys.shuffle(&mut rand::rng());

        let mut drawn = BTreeMap::new();
        for key in keys.into_iter().take(count) {
            if let Some(value) = self.instance.remove(&key) {
                drawn.insert(key, value);
            }
        }
        Ok(drawn)
    }

    /// Resets the undrawn pool to the template minus `still_out` keys.
    ///
    /// "Everything not currently placed on the table becomes drawable
    /// again." Keys in `still_out` that don't exist in the template are
    /// ignored.
    pub fn shuffle_discards(&mut self, still_out: &BTreeSet<String>) {
        self.instance = self
            .template
            .iter()
            .filter(|(k, _)| !still_out.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
    }

    /// Number of undrawn items.
    pub fn remaining(&self) -> usize {
        self.instance.len()
    }

    /// Size of the full pool.
    pub fn template_len(&self) -> usize {
        self.template.len()
    }

    /// Looks up an item's display value by key, drawn or not.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.template.get(key).map(String::as_str)
    }

    /// Keys of the currently-undrawn subset.
    pub fn instance_keys(&self) -> impl Iterator<Item = &str> {
        self.instance.keys().map(String::as_str)
    }
}
