//! Redis-backed state store.

use super::service::{StateStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// `SADD` the member and `LPUSH` the payload only if the member was new.
const PUSH_UNIQUE_SCRIPT: &str = r#"
if redis.call('SADD', KEYS[1], ARGV[1]) == 1 then
  redis.call('LPUSH', KEYS[2], ARGV[2])
  return 1
end
return 0
"#;

/// `RPOP` from the first non-empty lane and `SREM` the payload's member.
///
/// A payload that cannot be decoded is still popped so it cannot wedge the
/// lane; the caller sees it and reports it.
const POP_UNIQUE_SCRIPT: &str = r#"
for i = 2, #KEYS do
  local raw = redis.call('RPOP', KEYS[i])
  if raw then
    local ok, job = pcall(cjson.decode, raw)
    if ok and type(job) == 'table' and job[ARGV[1]] then
      redis.call('SREM', KEYS[1], job[ARGV[1]])
    end
    return raw
  end
end
return false
"#;

/// `INCR` only below the limit; the first increment sets the expiry.
const INCREMENT_WITHIN_LIMIT_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
  return -1
end
local value = redis.call('INCR', KEYS[1])
if value == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return value
"#;

const DELETE_IF_EQUALS_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('DEL', KEYS[1])
end
return 0
"#;

const SCAN_BATCH: usize = 500;

/// Redis implementation of [`StateStore`].
///
/// Uses `ConnectionManager` for connection reuse and automatic reconnects.
/// Multi-step mutations run as Lua scripts, which Redis executes atomically.
#[derive(Clone)]
pub struct RedisStore {
    client: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            StoreError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| StoreError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self { client: manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.client.clone()
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::OperationError(e.to_string())
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        let deleted: i64 = redis::cmd("EVAL")
            .arg(DELETE_IF_EQUALS_SCRIPT)
            .arg(1)
            .arg(key)
            .arg(expected)
            .query_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        Ok(conn.exists::<_, bool>(key).await?)
    }

    async fn increment_within_limit(
        &self,
        key: &str,
        limit: u64,
        ttl: Duration,
    ) -> StoreResult<Option<u64>> {
        let mut conn = self.conn();
        let value: i64 = redis::cmd("EVAL")
            .arg(INCREMENT_WITHIN_LIMIT_SCRIPT)
            .arg(1)
            .arg(key)
            .arg(limit)
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(u64::try_from(value).ok())
    }

    async fn push_unique(
        &self,
        set_key: &str,
        list_key: &str,
        member: &str,
        payload: &str,
    ) -> StoreResult<bool> {
        let mut conn = self.conn();
        let pushed: i64 = redis::cmd("EVAL")
            .arg(PUSH_UNIQUE_SCRIPT)
            .arg(2)
            .arg(set_key)
            .arg(list_key)
            .arg(member)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        debug!(member, list_key, pushed, "push_unique");
        Ok(pushed == 1)
    }

    async fn pop_unique(
        &self,
        set_key: &str,
        list_keys: &[String],
        member_field: &str,
    ) -> StoreResult<Option<String>> {
        let mut conn = self.conn();
        let mut cmd = redis::cmd("EVAL");
        cmd.arg(POP_UNIQUE_SCRIPT)
            .arg(1 + list_keys.len())
            .arg(set_key);
        for list_key in list_keys {
            cmd.arg(list_key);
        }
        cmd.arg(member_field);

        let raw: Option<String> = cmd.query_async(&mut conn).await?;
        Ok(raw)
    }

    async fn list_len(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.conn();
        Ok(conn.llen::<_, u64>(key).await?)
    }

    async fn set_contains(&self, set_key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        Ok(conn.sismember::<_, _, bool>(set_key, member).await?)
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    async fn value_len(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.conn();
        Ok(conn.strlen::<_, u64>(key).await?)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn();
        conn.ping::<()>().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(ttl_millis(Duration::from_secs(300)), 300_000);
        assert_eq!(ttl_millis(Duration::ZERO), 1);
    }
}
