use async_trait::async_trait;
use bb8::{Pool, PooledConnection, RunError};
use bb8_redis::RedisConnectionManager;
use redis::{ErrorKind, RedisError, Value};
use std::collections::HashSet;
use tracing::{debug, trace};

use tagcache_core::{CacheError, Command, KeyValueStore, Pipeline, Reply, Result};

use super::config::RedisConfig;

/// Redis store implementation
///
/// Pipelines are plain Redis pipelines, not MULTI/EXEC transactions.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisStore {
    /// Connect a new pool and verify it with a PING
    ///
    /// Fails with [`CacheError::AuthenticationFailed`] if the server rejects
    /// the configured password.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.connection_url()?.as_str())
            .map_err(map_redis_error)?;

        // Connection errors surface to the caller instead of being retried
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .retry_connection(false)
            .build(manager)
            .await
            .map_err(map_redis_error)?;

        let store = Self { pool };
        store.ping().await?;

        debug!(target: "tagcache::redis", pool_size = config.pool_size, "Connected to redis");
        Ok(store)
    }

    /// Wrap a pool owned by the caller
    pub fn with_pool(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    /// Round-trip a PING
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    /// Get connection from pool
    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool.get().await.map_err(|e| match e {
            RunError::User(e) => map_redis_error(e),
            other => CacheError::unavailable(other),
        })
    }

    /// Send a single command
    async fn run(&self, command: Command) -> Result<Reply> {
        let mut conn = self.get_connection().await?;
        let value: Value = to_cmd(&command)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        reply_from_value(&command, value)
    }
}

fn map_redis_error(e: RedisError) -> CacheError {
    if e.kind() == ErrorKind::AuthenticationFailed {
        CacheError::AuthenticationFailed
    } else {
        CacheError::unavailable(e)
    }
}

/// Translate a command into its Redis wire form
fn to_cmd(command: &Command) -> redis::Cmd {
    let mut cmd = redis::cmd(command.name());
    match command {
        Command::Get { key }
        | Command::SetMembers { key }
        | Command::Exists { key } => {
            cmd.arg(key);
        }
        Command::MultiGet { keys } | Command::DeleteKeys { keys } => {
            cmd.arg(keys);
        }
        Command::Set { key, value } => {
            cmd.arg(key).arg(value);
        }
        Command::MultiSet { pairs } => {
            for (key, value) in pairs {
                cmd.arg(key).arg(value);
            }
        }
        Command::SetAdd { key, member } => {
            cmd.arg(key).arg(member);
        }
        Command::ExpireAt { key, timestamp } => {
            cmd.arg(key).arg(*timestamp);
        }
        Command::ExpireIn { key, seconds } => {
            cmd.arg(key).arg(*seconds);
        }
        Command::FlushAll => {}
    }
    cmd
}

/// Convert the raw reply of `command` into a typed reply
fn reply_from_value(command: &Command, value: Value) -> Result<Reply> {
    match (command, value) {
        (_, Value::ServerError(e)) => Err(CacheError::unavailable(format!("{:?}", e))),
        (Command::Get { .. }, Value::Nil) => Ok(Reply::Nil),
        (Command::Get { .. }, value) => string_from(value).map(Reply::Value),
        (Command::MultiGet { .. }, Value::Array(items)) => items
            .into_iter()
            .map(optional_string)
            .collect::<Result<Vec<_>>>()
            .map(Reply::Values),
        (Command::SetMembers { .. }, Value::Array(items) | Value::Set(items)) => items
            .into_iter()
            .map(string_from)
            .collect::<Result<HashSet<_>>>()
            .map(Reply::Members),
        (
            Command::Set { .. } | Command::MultiSet { .. } | Command::FlushAll,
            Value::Okay | Value::SimpleString(_),
        ) => Ok(Reply::Ok),
        (
            Command::SetAdd { .. }
            | Command::ExpireAt { .. }
            | Command::ExpireIn { .. }
            | Command::DeleteKeys { .. }
            | Command::Exists { .. },
            Value::Int(n),
        ) => Ok(Reply::Integer(n)),
        (command, other) => Err(CacheError::unavailable(format!(
            "unexpected reply to {}: {:?}",
            command.name(),
            other
        ))),
    }
}

fn string_from(value: Value) -> Result<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes).map_err(CacheError::unavailable),
        Value::SimpleString(s) => Ok(s),
        other => Err(CacheError::unavailable(format!(
            "expected string reply, got {:?}",
            other
        ))),
    }
}

fn optional_string(value: Value) -> Result<Option<String>> {
    match value {
        Value::Nil => Ok(None),
        value => string_from(value).map(Some),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.run(Command::Get {
            key: key.to_string(),
        })
        .await?
        .into_value()
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.run(Command::MultiGet {
            keys: keys.to_vec(),
        })
        .await?
        .into_values()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.run(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        self.run(Command::MultiSet {
            pairs: pairs.to_vec(),
        })
        .await?;
        Ok(())
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<bool> {
        let reply = self
            .run(Command::SetAdd {
                key: set_key.to_string(),
                member: member.to_string(),
            })
            .await?;
        Ok(reply.as_integer()? > 0)
    }

    async fn set_members(&self, set_key: &str) -> Result<HashSet<String>> {
        self.run(Command::SetMembers {
            key: set_key.to_string(),
        })
        .await?
        .into_members()
    }

    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool> {
        let reply = self
            .run(Command::ExpireAt {
                key: key.to_string(),
                timestamp,
            })
            .await?;
        Ok(reply.as_integer()? > 0)
    }

    async fn expire_in(&self, key: &str, seconds: i64) -> Result<bool> {
        let reply = self
            .run(Command::ExpireIn {
                key: key.to_string(),
                seconds,
            })
            .await?;
        Ok(reply.as_integer()? > 0)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let reply = self
            .run(Command::DeleteKeys {
                keys: keys.to_vec(),
            })
            .await?;
        Ok(reply.as_integer()?.max(0) as u64)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let reply = self
            .run(Command::Exists {
                key: key.to_string(),
            })
            .await?;
        Ok(reply.as_integer()? > 0)
    }

    async fn flush_all(&self) -> Result<()> {
        self.run(Command::FlushAll).await?;
        Ok(())
    }

    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<Reply>> {
        if pipeline.is_empty() {
            return Ok(Vec::new());
        }

        let commands = pipeline.into_commands();
        let mut pipe = redis::pipe();
        for command in &commands {
            pipe.add_command(to_cmd(command));
        }

        trace!(target: "tagcache::redis", commands = commands.len(), "Executing pipeline");

        let mut conn = self.get_connection().await?;
        let values: Vec<Value> = pipe
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;

        if values.len() != commands.len() {
            return Err(CacheError::unavailable(format!(
                "pipeline returned {} replies for {} commands",
                values.len(),
                commands.len()
            )));
        }

        commands
            .iter()
            .zip(values)
            .map(|(command, value)| reply_from_value(command, value))
            .collect()
    }
}
