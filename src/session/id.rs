//! Opaque session identifiers.

use rand::Rng;

/// Symbols a session identifier is drawn from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ123456789-&()_";

/// Draw `len` symbols uniformly from [`ALPHABET`].
///
/// Uses the thread-local CSPRNG, so concurrent callers never share generator
/// state. Uniqueness is probabilistic; nothing checks the store first.
#[must_use]
pub fn generate(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}
