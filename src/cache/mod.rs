use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod disk;
pub mod memory;

/// A cache API used to make custom cache implementations.
///
/// Implementations must never surface storage failures: a failed read behaves like a
/// miss and a failed write or removal is a no-op.
pub trait FlagCache: Sync + Send {
    /// Gets the value identified by the given `key`, or [`None`] when it's missing or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes the given `value` by the given `key`, overwriting any previous value and
    /// expiry. A `ttl` of [`None`] (or zero) keeps the value until it's overwritten or removed.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    /// Removes the value identified by the given `key`.
    fn remove(&self, key: &str);

    /// Gets the value identified by the given `key`, or `default` when it's missing or expired.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }
}

/// A stored value together with its absolute expiry (Unix epoch, milliseconds).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The stored value.
    pub value: String,
    /// When the entry expires; [`None`] means never.
    pub expires_at: Option<i64>,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: &str, ttl: Option<Duration>) -> Self {
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| {
                let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                Utc::now().timestamp_millis().saturating_add(ttl)
            });
        Self {
            value: value.to_owned(),
            expires_at,
        }
    }

    /// Whether the entry is past its expiry at `now` (Unix epoch, milliseconds).
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

#[cfg(test)]
mod cache_entry_tests {
    use crate::CacheEntry;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn no_ttl_never_expires() {
        let entry = CacheEntry::new("v", None);
        assert_eq!(entry.expires_at, None);
        assert!(!entry.is_expired(i64::MAX));
    }

    #[test]
    fn zero_ttl_never_expires() {
        let entry = CacheEntry::new("v", Some(Duration::ZERO));
        assert_eq!(entry.expires_at, None);
    }

    #[test]
    fn expiry_is_inclusive() {
        let entry = CacheEntry {
            value: "v".to_owned(),
            expires_at: Some(1000),
        };
        assert!(!entry.is_expired(999));
        assert!(!entry.is_expired(1000));
        assert!(entry.is_expired(1001));
    }

    #[test]
    fn huge_ttl_does_not_wrap() {
        let entry = CacheEntry::new("v", Some(Duration::MAX));
        assert_eq!(entry.expires_at, Some(i64::MAX));
        assert!(!entry.is_expired(Utc::now().timestamp_millis()));
    }

    #[test]
    fn value_with_separators_survives_serialization() {
        let entry = CacheEntry::new(r#"a|b|{"c":1}"#, Some(Duration::from_secs(60)));
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(serde_json::from_str::<CacheEntry>(&json).unwrap(), entry);
    }
}
