//! Persistent access/refresh token pair with absolute expiry instants.
//!
//! Reading a token is itself an expiry check: once the refresh window has
//! elapsed the whole set is cleared and every read returns `None`, even if
//! the access token's own expiry is still in the future.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::clock::Clock;
use crate::storage::KeyValueStorage;

pub const ACCESS_TOKEN_KEY: &str = "salon.access_token";
pub const REFRESH_TOKEN_KEY: &str = "salon.refresh_token";
pub const ACCESS_EXPIRES_AT_KEY: &str = "salon.access_expires_at";
pub const REFRESH_EXPIRES_AT_KEY: &str = "salon.refresh_expires_at";

const ALL_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    ACCESS_EXPIRES_AT_KEY,
    REFRESH_EXPIRES_AT_KEY,
];

/// Access token lifetime when the server does not say.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
/// Refresh tokens are trusted for this long after login, whatever the server claims.
pub const REFRESH_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
/// Access tokens with less than this left are refreshed before use.
pub const NEAR_EXPIRY_THRESHOLD: Duration = Duration::from_millis(120_000);

#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Stores a fresh login. The refresh window always starts now.
    pub fn set_login_tokens(&self, access: &str, refresh: &str, expires_in_secs: Option<u64>) {
        let now = self.clock.now_ms();
        self.storage.set(ACCESS_TOKEN_KEY, access);
        self.storage.set(REFRESH_TOKEN_KEY, refresh);
        self.storage
            .set(ACCESS_EXPIRES_AT_KEY, &access_expiry(now, expires_in_secs).to_string());
        self.storage.set(
            REFRESH_EXPIRES_AT_KEY,
            &now.saturating_add(REFRESH_WINDOW.as_millis() as i64).to_string(),
        );
    }

    /// Replaces the access token only; the refresh pair is left alone.
    pub fn update_access_token(&self, access: &str, expires_in_secs: Option<u64>) {
        let now = self.clock.now_ms();
        self.storage.set(ACCESS_TOKEN_KEY, access);
        self.storage
            .set(ACCESS_EXPIRES_AT_KEY, &access_expiry(now, expires_in_secs).to_string());
    }

    /// True when no access expiry is recorded or less than `threshold` remains.
    pub fn is_access_near_expiry(&self, threshold: Duration) -> bool {
        match self.access_expires_at() {
            Some(expires_at) => {
                let threshold = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
                expires_at.saturating_sub(self.clock.now_ms()) < threshold
            }
            None => true,
        }
    }

    /// True when no refresh expiry is recorded or it has passed.
    pub fn is_refresh_expired(&self) -> bool {
        match self.refresh_expires_at() {
            Some(expires_at) => self.clock.now_ms() >= expires_at,
            None => true,
        }
    }

    pub fn access(&self) -> Option<String> {
        if self.expire_if_refresh_lapsed() {
            return None;
        }
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh(&self) -> Option<String> {
        if self.expire_if_refresh_lapsed() {
            return None;
        }
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    pub fn access_expires_at(&self) -> Option<i64> {
        read_instant(self.storage.as_ref(), ACCESS_EXPIRES_AT_KEY)
    }

    pub fn refresh_expires_at(&self) -> Option<i64> {
        read_instant(self.storage.as_ref(), REFRESH_EXPIRES_AT_KEY)
    }

    /// Whether a usable login is held right now.
    pub fn has_session(&self) -> bool {
        self.refresh().is_some()
    }

    pub fn clear(&self) {
        debug!("Clearing stored tokens");
        self.storage.remove_all(&ALL_KEYS);
    }

    fn expire_if_refresh_lapsed(&self) -> bool {
        if self.is_refresh_expired() {
            if self.storage.get(ACCESS_TOKEN_KEY).is_some()
                || self.storage.get(REFRESH_TOKEN_KEY).is_some()
            {
                debug!("Refresh window elapsed, dropping session");
            }
            self.clear();
            return true;
        }
        false
    }
}

fn access_expiry(now: i64, expires_in_secs: Option<u64>) -> i64 {
    let ttl_ms = match expires_in_secs {
        Some(secs) => i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX),
        None => DEFAULT_ACCESS_TTL.as_millis() as i64,
    };
    now.saturating_add(ttl_ms)
}

fn read_instant(storage: &dyn KeyValueStorage, key: &str) -> Option<i64> {
    storage.get(key).and_then(|raw| raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    const T0: i64 = 1_700_000_000_000;

    fn store() -> (TokenStore, ManualClock, Arc<MemoryStorage>) {
        let clock = ManualClock::new(T0);
        let storage = Arc::new(MemoryStorage::new());
        let store = TokenStore::new(storage.clone(), Arc::new(clock.clone()));
        (store, clock, storage)
    }

    #[test]
    fn login_sets_both_expiries() {
        let (store, _, _) = store();
        store.set_login_tokens("access", "refresh", Some(600));

        assert_eq!(store.access().as_deref(), Some("access"));
        assert_eq!(store.refresh().as_deref(), Some("refresh"));
        assert_eq!(store.access_expires_at(), Some(T0 + 600_000));
        assert_eq!(store.refresh_expires_at(), Some(T0 + 86_400_000));
    }

    #[test]
    fn huge_expires_in_saturates_instead_of_wrapping() {
        let (store, _, _) = store();
        store.set_login_tokens("a", "r", Some(9_223_372_036_854_775));
        assert_eq!(store.access_expires_at(), Some(i64::MAX));
        assert!(!store.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD));

        store.update_access_token("b", Some(u64::MAX));
        assert_eq!(store.access_expires_at(), Some(i64::MAX));
        assert!(!store.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD));
    }

    #[test]
    fn near_expiry_check_tolerates_extreme_stored_values() {
        let (store, _, storage) = store();
        store.set_login_tokens("a", "r", Some(60));
        storage.set(ACCESS_EXPIRES_AT_KEY, &i64::MIN.to_string());
        assert!(store.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD));
    }

    #[test]
    fn missing_expires_in_defaults_to_fifteen_minutes() {
        let (store, _, _) = store();
        store.set_login_tokens("access", "refresh", None);
        assert_eq!(store.access_expires_at(), Some(T0 + 900_000));
    }

    #[test]
    fn update_access_leaves_refresh_pair_alone() {
        let (store, clock, _) = store();
        store.set_login_tokens("a1", "r1", Some(60));
        clock.advance(Duration::from_secs(30));

        store.update_access_token("a2", Some(900));

        assert_eq!(store.access().as_deref(), Some("a2"));
        assert_eq!(store.access_expires_at(), Some(T0 + 30_000 + 900_000));
        assert_eq!(store.refresh().as_deref(), Some("r1"));
        assert_eq!(store.refresh_expires_at(), Some(T0 + 86_400_000));
    }

    #[test]
    fn near_expiry_uses_threshold() {
        let (store, clock, _) = store();
        assert!(store.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD));

        store.set_login_tokens("a", "r", Some(300));
        assert!(!store.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD));

        clock.advance(Duration::from_secs(181));
        assert!(store.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD));
    }

    #[test]
    fn refresh_expiry_dominates_access_expiry() {
        let (store, clock, storage) = store();
        store.set_login_tokens("a", "r", Some(900));
        // Access still has plenty of life on paper.
        storage.set(ACCESS_EXPIRES_AT_KEY, &(T0 + 200_000_000).to_string());

        clock.advance(REFRESH_WINDOW);

        assert!(store.is_refresh_expired());
        assert_eq!(store.access(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn reading_after_refresh_lapse_clears_all_four_values() {
        for past in [1_i64, 1_000, 86_400_000] {
            let (store, _, storage) = store();
            storage.set(ACCESS_TOKEN_KEY, "a");
            storage.set(REFRESH_TOKEN_KEY, "r");
            storage.set(ACCESS_EXPIRES_AT_KEY, &(T0 + 60_000).to_string());
            storage.set(REFRESH_EXPIRES_AT_KEY, &(T0 - past).to_string());

            assert_eq!(store.refresh(), None);
            assert_eq!(store.access(), None);
            assert!(storage.is_empty(), "values left behind for expiry {past}ms ago");
        }
    }

    #[test]
    fn tokens_without_refresh_expiry_are_not_trusted() {
        let (store, _, storage) = store();
        storage.set(ACCESS_TOKEN_KEY, "a");
        assert!(store.is_refresh_expired());
        assert_eq!(store.access(), None);
        assert!(!store.has_session());
    }

    #[test]
    fn clear_removes_everything() {
        let (store, _, storage) = store();
        store.set_login_tokens("a", "r", None);
        store.clear();
        assert!(storage.is_empty());
        assert_eq!(store.access_expires_at(), None);
    }
}
