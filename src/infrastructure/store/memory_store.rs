//! Process-local state store.

use super::service::{StateStore, StoreError, StoreResult};
use crate::domain::clock::{Clock, SystemClock, saturating_after};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(VecDeque<String>),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory implementation of [`StateStore`].
///
/// Every operation takes one mutex, which gives the same atomicity the Redis
/// scripts give across processes, but only within this process. Expiry is
/// evaluated lazily against the injected [`Clock`].
///
/// # Use Cases
///
/// - Unit and integration tests (paired with a manual clock)
/// - Single-process development without Redis
///
/// [`MemoryStore::set_available`] simulates an outage: while unavailable,
/// every operation fails with [`StoreError::ConnectionError`].
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Slot>>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl MemoryStore {
    /// Creates a store driven by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        debug!("Using MemoryStore (state is process-local)");
        Self {
            slots: Mutex::new(HashMap::new()),
            clock,
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Locks the map after dropping every expired slot.
    fn slots(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Slot>>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionError(
                "memory store marked unavailable".to_string(),
            ));
        }

        let mut slots = self
            .slots
            .lock()
            .map_err(|e| StoreError::OperationError(format!("memory store poisoned: {}", e)))?;

        let now = self.clock.now();
        slots.retain(|_, slot| slot.expires_at.is_none_or(|at| at > now));
        Ok(slots)
    }

    fn expiry(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        Some(saturating_after(self.clock.now(), ttl))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::OperationError(format!("wrong value type at key '{}'", key))
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let slots = self.slots()?;
        match slots.get(key).map(|slot| &slot.value) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let expires_at = self.expiry(ttl);
        let mut slots = self.slots()?;
        slots.insert(
            key.to_string(),
            Slot {
                value: Value::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let expires_at = self.expiry(ttl);
        let mut slots = self.slots()?;
        if slots.contains_key(key) {
            return Ok(false);
        }
        slots.insert(
            key.to_string(),
            Slot {
                value: Value::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut slots = self.slots()?;
        Ok(slots.remove(key).is_some())
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let mut slots = self.slots()?;
        let matches = matches!(
            slots.get(key).map(|slot| &slot.value),
            Some(Value::Text(text)) if text == expected
        );
        if matches {
            slots.remove(key);
        }
        Ok(matches)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let slots = self.slots()?;
        Ok(slots.contains_key(key))
    }

    async fn increment_within_limit(
        &self,
        key: &str,
        limit: u64,
        ttl: Duration,
    ) -> StoreResult<Option<u64>> {
        let expires_at = self.expiry(ttl);
        let mut slots = self.slots()?;

        let current = match slots.get(key).map(|slot| &slot.value) {
            None => 0,
            Some(Value::Text(text)) => text.parse::<u64>().map_err(|_| wrong_type(key))?,
            Some(_) => return Err(wrong_type(key)),
        };

        if current >= limit {
            return Ok(None);
        }

        let next = current + 1;
        match slots.get_mut(key) {
            Some(slot) => slot.value = Value::Text(next.to_string()),
            None => {
                slots.insert(
                    key.to_string(),
                    Slot {
                        value: Value::Text(next.to_string()),
                        expires_at,
                    },
                );
            }
        }
        Ok(Some(next))
    }

    async fn push_unique(
        &self,
        set_key: &str,
        list_key: &str,
        member: &str,
        payload: &str,
    ) -> StoreResult<bool> {
        let mut slots = self.slots()?;

        if let Some(slot) = slots.get(list_key)
            && !matches!(slot.value, Value::List(_))
        {
            return Err(wrong_type(list_key));
        }

        let set_slot = slots.entry(set_key.to_string()).or_insert_with(|| Slot {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });
        let Value::Set(members) = &mut set_slot.value else {
            return Err(wrong_type(set_key));
        };
        if !members.insert(member.to_string()) {
            return Ok(false);
        }

        let list_slot = slots.entry(list_key.to_string()).or_insert_with(|| Slot {
            value: Value::List(VecDeque::new()),
            expires_at: None,
        });
        if let Value::List(items) = &mut list_slot.value {
            items.push_front(payload.to_string());
        }
        Ok(true)
    }

    async fn pop_unique(
        &self,
        set_key: &str,
        list_keys: &[String],
        member_field: &str,
    ) -> StoreResult<Option<String>> {
        let mut slots = self.slots()?;

        let mut popped = None;
        for list_key in list_keys {
            let raw = match slots.get_mut(list_key) {
                Some(Slot {
                    value: Value::List(items),
                    ..
                }) => items.pop_back(),
                Some(_) => return Err(wrong_type(list_key)),
                None => None,
            };

            if let Some(raw) = raw {
                let drained = matches!(
                    slots.get(list_key),
                    Some(Slot { value: Value::List(items), .. }) if items.is_empty()
                );
                if drained {
                    slots.remove(list_key);
                }
                popped = Some(raw);
                break;
            }
        }

        let Some(raw) = popped else {
            return Ok(None);
        };

        let member = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.get(member_field).and_then(|m| m.as_str().map(str::to_string)));
        if let Some(member) = member
            && let Some(Slot {
                value: Value::Set(members),
                ..
            }) = slots.get_mut(set_key)
        {
            members.remove(&member);
        }

        Ok(Some(raw))
    }

    async fn list_len(&self, key: &str) -> StoreResult<u64> {
        let slots = self.slots()?;
        match slots.get(key).map(|slot| &slot.value) {
            None => Ok(0),
            Some(Value::List(items)) => Ok(items.len() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_contains(&self, set_key: &str, member: &str) -> StoreResult<bool> {
        let slots = self.slots()?;
        match slots.get(set_key).map(|slot| &slot.value) {
            None => Ok(false),
            Some(Value::Set(members)) => Ok(members.contains(member)),
            Some(_) => Err(wrong_type(set_key)),
        }
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let slots = self.slots()?;
        Ok(slots
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn value_len(&self, key: &str) -> StoreResult<u64> {
        let slots = self.slots()?;
        match slots.get(key).map(|slot| &slot.value) {
            None => Ok(0),
            Some(Value::Text(text)) => Ok(text.len() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn health_check(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;

    fn store_with_clock() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (MemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_values_expire_with_clock() {
        let (store, clock) = store_with_clock();

        store
            .set_with_ttl("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        clock.advance(Duration::from_secs(11));
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unbounded_ttl_saturates() {
        let (store, clock) = store_with_clock();

        store
            .set_with_ttl("k", "v", Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_set_if_absent_is_exclusive_until_expiry() {
        let (store, clock) = store_with_clock();
        let ttl = Duration::from_secs(300);

        assert!(store.set_if_absent("lock", "a", ttl).await.unwrap());
        assert!(!store.set_if_absent("lock", "b", ttl).await.unwrap());

        clock.advance(Duration::from_secs(301));
        assert!(store.set_if_absent("lock", "b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_if_equals_checks_value() {
        let (store, _) = store_with_clock();
        let ttl = Duration::from_secs(60);
        store.set_if_absent("lock", "holder-a", ttl).await.unwrap();

        assert!(!store.delete_if_equals("lock", "holder-b").await.unwrap());
        assert!(store.exists("lock").await.unwrap());
        assert!(store.delete_if_equals("lock", "holder-a").await.unwrap());
        assert!(!store.exists("lock").await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_within_limit_stops_at_limit() {
        let (store, _) = store_with_clock();
        let ttl = Duration::from_secs(60);

        assert_eq!(
            store.increment_within_limit("c", 2, ttl).await.unwrap(),
            Some(1)
        );
        assert_eq!(
            store.increment_within_limit("c", 2, ttl).await.unwrap(),
            Some(2)
        );
        assert_eq!(store.increment_within_limit("c", 2, ttl).await.unwrap(), None);
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_counter_expiry_set_on_first_increment_only() {
        let (store, clock) = store_with_clock();

        store
            .increment_within_limit("c", 10, Duration::from_secs(100))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(60));
        store
            .increment_within_limit("c", 10, Duration::from_secs(100))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(41));

        assert!(store.get("c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_push_unique_and_pop_unique() {
        let (store, _) = store_with_clock();
        let lanes = vec!["high".to_string(), "low".to_string()];

        assert!(
            store
                .push_unique("members", "low", "pas", r#"{"key":"pas"}"#)
                .await
                .unwrap()
        );
        assert!(
            !store
                .push_unique("members", "high", "pas", r#"{"key":"pas"}"#)
                .await
                .unwrap()
        );
        assert!(
            store
                .push_unique("members", "high", "kuća", r#"{"key":"kuća"}"#)
                .await
                .unwrap()
        );

        let first = store.pop_unique("members", &lanes, "key").await.unwrap();
        assert_eq!(first.as_deref(), Some(r#"{"key":"kuća"}"#));
        assert!(!store.set_contains("members", "kuća").await.unwrap());
        assert!(store.set_contains("members", "pas").await.unwrap());

        let second = store.pop_unique("members", &lanes, "key").await.unwrap();
        assert_eq!(second.as_deref(), Some(r#"{"key":"pas"}"#));
        assert!(store.pop_unique("members", &lanes, "key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lists_are_fifo() {
        let (store, _) = store_with_clock();
        let lanes = vec!["q".to_string()];

        for word in ["a", "b", "c"] {
            let payload = format!(r#"{{"key":"{}"}}"#, word);
            store.push_unique("m", "q", word, &payload).await.unwrap();
        }

        let popped = store.pop_unique("m", &lanes, "key").await.unwrap().unwrap();
        assert_eq!(popped, r#"{"key":"a"}"#);
        assert_eq!(store.list_len("q").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let (store, _) = store_with_clock();
        store.set_available(false);

        assert!(matches!(
            store.get("k").await,
            Err(StoreError::ConnectionError(_))
        ));
        assert!(store.list_len("q").await.is_err());
        assert!(!store.health_check().await);

        store.set_available(true);
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scan_prefix_and_value_len() {
        let (store, _) = store_with_clock();
        let ttl = Duration::from_secs(60);
        store.set_with_ttl("image_cache:a", "1234", ttl).await.unwrap();
        store.set_with_ttl("image_cache:b", "12", ttl).await.unwrap();
        store.set_with_ttl("other", "x", ttl).await.unwrap();

        let mut keys = store.scan_prefix("image_cache:").await.unwrap();
        keys.sort();

        assert_eq!(keys, vec!["image_cache:a", "image_cache:b"]);
        assert_eq!(store.value_len("image_cache:a").await.unwrap(), 4);
        assert_eq!(store.value_len("missing").await.unwrap(), 0);
    }
}
