// src/utils/token.rs

//! Opaque tokens tying a client-visible error to its log line.

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz1234567890";

/// Length of tokens handed out with internal errors.
pub const TOKEN_LEN: usize = 8;

/// Random lowercase-alphanumeric token of `len` characters.
pub fn correlation_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// A fresh token from the thread-local generator.
pub fn new_token() -> String {
    correlation_token(&mut rand::rng(), TOKEN_LEN)
}
