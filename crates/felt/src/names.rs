//! Room slug generation.
//!
//! Rooms get human-shareable word-triplet names like
//! "PurpleHappyBadger": easy to read aloud across a table, unique
//! enough that collisions are a retry, not a problem.

use rand::Rng;
use rand::seq::IndexedRandom;

const SHADES: &[&str] = &[
    "Amber", "Azure", "Copper", "Coral", "Crimson", "Dusty", "Golden", "Green", "Grey", "Indigo",
    "Ivory", "Jade", "Mauve", "Olive", "Onyx", "Pearl", "Plum", "Purple", "Rose", "Ruby",
    "Russet", "Sable", "Scarlet", "Silver", "Teal", "Umber", "Violet", "White",
];

const MOODS: &[&str] = &[
    "Bold", "Brave", "Breezy", "Calm", "Cheery", "Clever", "Daring", "Dozy", "Eager", "Gentle",
    "Giddy", "Happy", "Hasty", "Jolly", "Keen", "Lively", "Lucky", "Merry", "Nimble", "Patient",
    "Plucky", "Proud", "Quiet", "Shy", "Sleepy", "Sly", "Steady", "Witty",
];

const ANIMALS: &[&str] = &[
    "Badger", "Bison", "Crane", "Ferret", "Fox", "Gecko", "Heron", "Ibex", "Jackal", "Kestrel",
    "Lemur", "Lynx", "Magpie", "Marmot", "Marten", "Mole", "Newt", "Otter", "Owl", "Pika",
    "Puffin", "Raven", "Shrew", "Stoat", "Swift", "Tapir", "Vole", "Wren",
];

/// Generates a word-triplet room slug with no spaces, each word
/// title-cased: shade + mood + animal.
pub fn generate_slug(rng: &mut impl Rng) -> String {
    let mut slug = String::new();
    for list in [SHADES, MOODS, ANIMALS] {
        // Lists are non-empty constants; choose can't miss.
        if let Some(word) = list.choose(rng) {
            slug.push_str(word);
        }
    }
    slug
}
