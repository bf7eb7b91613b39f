//! Random key generation.

use crate::config::GateConfig;
use rand::Rng;

/// Characters a generated key may contain after its prefix.
const KEY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces prefixed, randomized key identifiers.
///
/// The generator makes no uniqueness guarantee; collision handling is the
/// registry's job.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
    random_len: usize,
}

impl KeyGenerator {
    /// Creates a generator with the given prefix and random suffix length.
    pub fn new(prefix: impl Into<String>, random_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            random_len,
        }
    }

    /// Creates a generator from a deployment profile.
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.key_prefix.clone(), config.key_random_len)
    }

    /// Generates a new key: the prefix followed by uniform `[A-Z0-9]`
    /// characters.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut key = String::with_capacity(self.prefix.len() + self.random_len);
        key.push_str(&self.prefix);
        for _ in 0..self.random_len {
            let idx = rng.gen_range(0..KEY_CHARSET.len());
            key.push(KEY_CHARSET[idx] as char);
        }
        key
    }
}
