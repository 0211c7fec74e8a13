// Cache key construction
// Author: kelexine (https://github.com/kelexine)

use sha2::{Digest, Sha256};
use std::fmt;

/// A scalar query parameter with a fixed textual form.
///
/// Every variant renders to exactly one canonical string, so the same
/// logical parameter always hashes the same way regardless of how the
/// caller produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Float(f64),
}

impl KeyParam {
    pub fn canonical(&self) -> String {
        match self {
            KeyParam::Text(s) => format!("s:{}", s),
            KeyParam::Int(i) => format!("i:{}", i),
            KeyParam::Bool(b) => format!("b:{}", b),
            KeyParam::Float(f) => {
                let normalized = if f.is_nan() {
                    f64::NAN
                } else if *f == 0.0 {
                    0.0
                } else {
                    *f
                };
                format!("f:{:016x}", normalized.to_bits())
            }
        }
    }
}

impl From<&str> for KeyParam {
    fn from(s: &str) -> Self {
        KeyParam::Text(s.to_string())
    }
}

impl From<String> for KeyParam {
    fn from(s: String) -> Self {
        KeyParam::Text(s)
    }
}

impl From<i64> for KeyParam {
    fn from(i: i64) -> Self {
        KeyParam::Int(i)
    }
}

impl From<bool> for KeyParam {
    fn from(b: bool) -> Self {
        KeyParam::Bool(b)
    }
}

impl From<f64> for KeyParam {
    fn from(f: f64) -> Self {
        KeyParam::Float(f)
    }
}

/// Address of one cached query result: `{prefix}:{query_type}:{sha256}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a query.
    ///
    /// Named parameters are sorted by name before hashing, so callers may
    /// pass them in any order. Each field is length-prefixed, which keeps
    /// `("ab", "c")` and `("a", "bc")` apart.
    pub fn build(
        prefix: &str,
        query_type: &str,
        column: &str,
        params: &[(&str, KeyParam)],
    ) -> Self {
        let mut sorted: Vec<(&str, String)> = params
            .iter()
            .map(|(name, value)| (*name, value.canonical()))
            .collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        update_field(&mut hasher, query_type);
        update_field(&mut hasher, column);
        for (name, value) in &sorted {
            update_field(&mut hasher, name);
            update_field(&mut hasher, value);
        }

        CacheKey(format!("{}:{}:{:x}", prefix, query_type, hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    pub fn short(&self) -> &str {
        let len = self.0.len();
        &self.0[len.saturating_sub(16)..]
    }
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field.as_bytes());
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cache_key_generation() {
        let key1 = CacheKey::build("fc", "avg_delay", "ARR_DELAY", &[("group", "OP_CARRIER".into())]);
        let key2 = CacheKey::build("fc", "avg_delay", "ARR_DELAY", &[("group", "OP_CARRIER".into())]);

        // Same inputs should produce same key
        assert_eq!(key1, key2);

        // Different column should produce different key
        let key3 = CacheKey::build("fc", "avg_delay", "DEP_DELAY", &[("group", "OP_CARRIER".into())]);
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_key_is_stable_across_runs() {
        // Pinned so a change to the canonical encoding is caught; a changed
        // digest would orphan every entry already in the store.
        let key = CacheKey::build("flightcache", "avg_delay", "ARR_DELAY", &[]);
        assert_eq!(
            key.as_str(),
            "flightcache:avg_delay:3756eab06cf451b225c0a16d7e57b793636bba040146d9024df16d57de85b435"
        );
    }

    #[test]
    fn test_param_order_does_not_matter() {
        let a = CacheKey::build(
            "fc",
            "flight_count",
            "ORIGIN",
            &[("include_cancelled", true.into()), ("group", "ORIGIN".into())],
        );
        let b = CacheKey::build(
            "fc",
            "flight_count",
            "ORIGIN",
            &[("group", "ORIGIN".into()), ("include_cancelled", true.into())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let a = CacheKey::build("fc", "ab", "c", &[]);
        let b = CacheKey::build("fc", "a", "bc", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_param_types_are_distinct() {
        let text = CacheKey::build("fc", "q", "c", &[("n", KeyParam::Text("1".into()))]);
        let int = CacheKey::build("fc", "q", "c", &[("n", KeyParam::Int(1))]);
        let float = CacheKey::build("fc", "q", "c", &[("n", KeyParam::Float(1.0))]);
        assert_ne!(text, int);
        assert_ne!(int, float);
    }

    #[test]
    fn test_float_canonicalization() {
        assert_eq!(KeyParam::Float(0.0).canonical(), KeyParam::Float(-0.0).canonical());
        assert_eq!(
            KeyParam::Float(f64::NAN).canonical(),
            KeyParam::Float(-f64::NAN).canonical()
        );
        assert_ne!(KeyParam::Float(0.1).canonical(), KeyParam::Float(0.2).canonical());
    }

    proptest! {
        #[test]
        fn prop_equal_inputs_equal_keys(
            tag in "[a-z_]{1,12}",
            column in "[A-Z_]{1,12}",
            n in any::<i64>(),
            flag in any::<bool>(),
        ) {
            let params = [("n", KeyParam::Int(n)), ("flag", KeyParam::Bool(flag))];
            let reversed = [("flag", KeyParam::Bool(flag)), ("n", KeyParam::Int(n))];
            prop_assert_eq!(
                CacheKey::build("fc", &tag, &column, &params),
                CacheKey::build("fc", &tag, &column, &reversed)
            );
        }

        #[test]
        fn prop_different_columns_different_keys(
            a in "[A-Z_]{1,12}",
            b in "[A-Z_]{1,12}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                CacheKey::build("fc", "avg_delay", &a, &[]),
                CacheKey::build("fc", "avg_delay", &b, &[])
            );
        }
    }
}
