//! Candidate normalization
//!
//! Every name entering the cache or the authoritative check goes through
//! the same folding: lower-case, restricted to `[a-z0-9_]`, length-bounded.
//! Normalized candidates are ephemeral; only the accepted one is committed.

use rand::Rng;

/// Root substituted when a base string normalizes to nothing
const PLACEHOLDER_ROOT: &str = "user";

/// Characters permitted in a normalized username
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

/// Normalize a requested base string into a candidate root
///
/// Lower-cases, strips everything outside the allowed class, and truncates
/// to `max_len`. An input that strips to nothing gets a randomly-suffixed
/// placeholder root instead, so allocation always has something to work
/// with.
pub fn normalize<R: Rng + ?Sized>(base: &str, max_len: usize, rng: &mut R) -> String {
    let mut root: String = base
        .to_lowercase()
        .chars()
        .filter(|c| is_allowed_char(*c))
        .collect();
    root.truncate(max_len);

    if root.is_empty() {
        root = format!("{}{:04}", PLACEHOLDER_ROOT, rng.gen_range(0..10_000));
    }
    root
}
