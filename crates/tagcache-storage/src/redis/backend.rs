use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use parking_lot::RwLock as SyncRwLock;
use redis::{AsyncCommands, RedisError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use tagcache_core::{
    BackendAdapter, BackendLimits, CacheError, CacheStats, CommandGroup, Expiration, GroupCommand,
    Result,
};

use super::config::RedisConfig;

/// Physical key type filtered for during SCAN
#[derive(Debug, Clone, Copy)]
enum KeyType {
    String,
    Set,
}

impl KeyType {
    fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Set => "set",
        }
    }
}

/// Redis backend implementation
///
/// Values are plain strings with native expiry, tag sets are Redis sets.
/// Grouped writes go out as a single non-transactional pipeline.
///
/// Only values expire. When Redis drops an expired value, its reverse
/// record and forward memberships stay behind as tombstones until a later
/// `set`, `remove`, `flush_by_tag` or `flush` touches them, so tag sets of
/// short-lived entries grow until flushed.
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
    stats: Arc<SyncRwLock<CacheStats>>,
}

impl RedisBackend {
    /// Create a new Redis backend
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|e| CacheError::Configuration(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        debug!(target: "tagcache", url = %config.url, pool_size = config.pool_size, "Redis pool ready");

        Ok(Self {
            pool,
            config,
            stats: Arc::new(SyncRwLock::new(CacheStats::default())),
        })
    }

    /// Get connection from pool
    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    /// Enumerate keys of one type starting with `prefix`
    async fn scan_prefix(&self, prefix: &str, key_type: KeyType) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let match_pattern = format!("{}*", escape_glob(prefix));

        let mut keys = Vec::new();
        let mut cursor = 0u64;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(&match_pattern)
                .arg("COUNT")
                .arg(self.config.scan_count)
                .arg("TYPE")
                .arg(key_type.as_str())
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error)?;

            keys.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

/// Build the SET command for a value
///
/// Relative lifetimes use `EX`, absolute ones `EXAT`, so the server
/// applies exactly the expiration the engine encoded.
fn set_command(key: &str, value: &[u8], expiration: Expiration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    match expiration {
        Expiration::Unlimited => {}
        Expiration::Relative(secs) => {
            cmd.arg("EX").arg(secs);
        }
        Expiration::Absolute(timestamp) => {
            cmd.arg("EXAT").arg(timestamp);
        }
    }
    cmd
}

/// Escape glob metacharacters so a prefix matches literally in SCAN
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Split transport failures from commands the server refused
fn map_redis_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        CacheError::Connection(e.to_string())
    } else {
        CacheError::Backend(e.to_string())
    }
}

#[async_trait]
impl BackendAdapter for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn limits(&self) -> BackendLimits {
        BackendLimits {
            max_key_length: self.config.max_key_length,
            max_value_size: self.config.max_value_size,
        }
    }

    fn supports_native_expiration(&self) -> bool {
        true
    }

    async fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;

        let bytes: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;

        let mut stats = self.stats.write();
        if bytes.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        Ok(bytes)
    }

    async fn kv_set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        let mut conn = self.get_connection().await?;

        set_command(key, value, expiration)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error)?;

        self.stats.write().writes += 1;
        Ok(())
    }

    async fn kv_delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        let deleted: u64 = conn.del(key).await.map_err(map_redis_error)?;

        if deleted > 0 {
            self.stats.write().deletes += 1;
        }
        Ok(deleted > 0)
    }

    async fn kv_exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        conn.exists(key).await.map_err(map_redis_error)
    }

    async fn set_add_member(&self, set_key: &str, member: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        conn.sadd::<_, _, ()>(set_key, member)
            .await
            .map_err(map_redis_error)
    }

    async fn set_remove_member(&self, set_key: &str, member: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        conn.srem::<_, _, ()>(set_key, member)
            .await
            .map_err(map_redis_error)
    }

    async fn set_list_members(&self, set_key: &str) -> Result<BTreeSet<String>> {
        let mut conn = self.get_connection().await?;

        let members: Vec<String> = conn.smembers(set_key).await.map_err(map_redis_error)?;

        Ok(members.into_iter().collect())
    }

    async fn set_clear(&self, set_key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        conn.del::<_, ()>(set_key).await.map_err(map_redis_error)
    }

    async fn kv_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.scan_prefix(prefix, KeyType::String).await
    }

    async fn set_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.scan_prefix(prefix, KeyType::Set).await
    }

    async fn execute_group(&self, group: CommandGroup) -> Result<()> {
        if group.is_empty() {
            return Ok(());
        }
        let mut conn = self.get_connection().await?;

        // Plain pipeline: no MULTI/EXEC, commands may interleave with other clients
        let mut pipe = redis::pipe();
        for command in group.commands() {
            match command {
                GroupCommand::KvDelete(key) => pipe.del(key).ignore(),
                GroupCommand::SetAdd { set, member } => pipe.sadd(set, member).ignore(),
                GroupCommand::SetRemove { set, member } => pipe.srem(set, member).ignore(),
                GroupCommand::SetClear(set) => pipe.del(set).ignore(),
            };
        }

        pipe.query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error)
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(self.stats.read().clone())
    }
}
