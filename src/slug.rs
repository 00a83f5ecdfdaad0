//! Slug generation and shape checks.
//!
//! A slug is `SLUG_LEN` characters from `[A-Za-z0-9-_]`.  The generator
//! and the validator share these constants and nothing else.

use rand::Rng;

/// Fixed length of every slug.
pub const SLUG_LEN: usize = 32;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a fresh random slug.
pub fn generate_slug() -> String {
    let mut rng = rand::rng();
    (0..SLUG_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Returns `true` if `s` has the exact length and alphabet of a slug.
pub fn is_valid_slug(s: &str) -> bool {
    s.len() == SLUG_LEN && s.bytes().all(|b| ALPHABET.contains(&b))
}

/// Source of slugs for newly created rows.
///
/// The lifecycle only ever asks for "the next slug"; production code uses
/// `RandomSlugs`, tests can substitute a deterministic sequence.
pub trait SlugGenerator: Send {
    fn next_slug(&mut self) -> String;
}

/// Random slugs from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSlugs;

impl SlugGenerator for RandomSlugs {
    fn next_slug(&mut self) -> String {
        generate_slug()
    }
}
