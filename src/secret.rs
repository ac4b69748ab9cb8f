//! Secure memory handling for passphrases and remote credentials
//!
//! Secrets live in memory only long enough to be handed to
//! `systemd-creds`; these types zero their contents on drop and never print
//! them.

use std::fmt;
use std::ops::Deref;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

/// A string type that zeros its contents on drop
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Create a new SecretString
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    /// Generate a random passphrase from `byte_len` bytes of OS entropy,
    /// base64 encoded
    pub fn generate(byte_len: usize) -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; byte_len]);
        OsRng.fill_bytes(&mut bytes);
        Self::new(STANDARD.encode(bytes.as_slice()))
    }

    /// Get the string contents
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Get the length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy the contents into a zeroizing byte buffer, e.g. for a child's stdin
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.inner.as_bytes().to_vec())
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretString")
            .field("len", &self.inner.len())
            .finish()
    }
}

// Don't print the contents in Display output
impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_creation() {
        let s = SecretString::new("hunter2");
        assert_eq!(s.expose(), "hunter2");
        assert_eq!(s.len(), 7);
    }

    #[test]
    fn test_generated_passphrase() {
        let a = SecretString::generate(32);
        let b = SecretString::generate(32);
        // 32 bytes of base64 with padding
        assert_eq!(a.len(), 44);
        assert!(STANDARD.decode(a.expose()).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_string_debug() {
        let s = SecretString::new("secret");
        let debug = format!("{:?}", s);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("SecretString"));
    }

    #[test]
    fn test_secret_string_display() {
        let s = SecretString::new("secret");
        let display = format!("{}", s);
        assert!(!display.contains("secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_to_bytes() {
        let s = SecretString::new("pw");
        assert_eq!(s.to_bytes().as_slice(), b"pw");
    }
}
