//! Request cache keys.
//!
//! A key is a 64-bit FNV-1a hash of the method, the URL and a structural
//! hash of the JSON body. Object keys are sorted before hashing so that
//! `{"a":1,"b":2}` and `{"b":2,"a":1}` share a key; arrays are hashed
//! element by element and then combined in order.

use serde_json::Value;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bumped when the hashing layout changes.
const KEY_FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy)]
struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Self(FNV_OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    /// Length-prefixed so adjacent fields cannot bleed into each other.
    fn write_str(&mut self, s: &str) {
        self.write(&(s.len() as u64).to_le_bytes());
        self.write(s.as_bytes());
    }

    fn write_u64(&mut self, n: u64) {
        self.write(&n.to_le_bytes());
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Deterministic cache key for a request descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Compute the cache key for `(method, url, body)`.
///
/// A missing body and a JSON `null` body hash differently.
pub fn cache_key(method: &str, url: &str, body: Option<&Value>) -> CacheKey {
    let mut hasher = Fnv1a::new();
    hasher.write(&[KEY_FORMAT_VERSION]);
    hasher.write_str(method);
    hasher.write_str(url);
    match body {
        None => hasher.write(b"-"),
        Some(value) => {
            hasher.write(b"+");
            hasher.write_u64(hash_value(value));
        }
    }
    CacheKey(hasher.finish())
}

/// Structural hash of a JSON value.
pub fn hash_value(value: &Value) -> u64 {
    let mut hasher = Fnv1a::new();
    match value {
        Value::Null => hasher.write(b"n"),
        Value::Bool(b) => hasher.write(if *b { b"t" } else { b"f" }),
        Value::Number(n) => {
            hasher.write(b"d");
            hasher.write_str(&n.to_string());
        }
        Value::String(s) => {
            hasher.write(b"s");
            hasher.write_str(s);
        }
        Value::Array(items) => {
            hasher.write(b"a");
            hasher.write_u64(items.len() as u64);
            for item in items {
                hasher.write_u64(hash_value(item));
            }
        }
        Value::Object(map) => {
            hasher.write(b"o");
            hasher.write_u64(map.len() as u64);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                hasher.write_str(key);
                hasher.write_u64(hash_value(&map[key]));
            }
        }
    }
    hasher.finish()
}
