use rand::Rng;

/// Characters a document key may contain
pub const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Default number of characters in a generated key
pub const DEFAULT_KEY_LENGTH: usize = 10;

/// Generates random lowercase document keys of a fixed length
///
/// Keys are drawn from a non-cryptographic thread-local RNG. Nothing checks
/// whether a key is already in use, so a collision overwrites the earlier
/// document.
#[derive(Debug, Clone, Copy)]
pub struct KeyGenerator {
    length: usize,
}

impl KeyGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect()
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_LENGTH)
    }
}
