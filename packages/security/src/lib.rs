// ABOUTME: Crosspost security library for protecting stored OAuth credentials
// ABOUTME: Provides AEAD encryption with a machine-derived key

pub mod encryption;

pub use encryption::{EncryptionError, TokenCipher};
