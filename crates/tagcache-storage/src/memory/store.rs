//! In-memory key/value store using DashMap

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use tagcache_core::{CacheError, Command, KeyValueStore, Pipeline, Reply, Result};

use super::expiry_index::ExpiryIndex;

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Configuration for the memory store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Interval of the background sweep of expired keys
    pub sweep_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl MemoryConfig {
    /// Create config with a specific sweep interval
    pub fn with_sweep_interval(interval: Duration) -> Self {
        Self {
            sweep_interval: interval,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Str(String),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    /// Absolute Unix second the entry expires at
    expires_at: Option<i64>,
}

impl Entry {
    fn new(slot: Slot) -> Self {
        Self {
            slot,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process store with string values, sets and per-key expiry
///
/// Commands execute one at a time, like a single-threaded server, and a
/// pipeline is applied in queue order without interleaving. Expired keys
/// are invisible to reads and are reclaimed lazily or by
/// [`purge_expired`](Self::purge_expired).
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone)]
pub struct MemoryStore {
    /// Main keyspace
    data: Arc<DashMap<String, Entry>>,
    /// Expiry schedule
    expiries: Arc<Mutex<ExpiryIndex>>,
    /// Serializes command execution
    serial: Arc<Mutex<()>>,
    config: MemoryConfig,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            expiries: Arc::new(Mutex::new(ExpiryIndex::new())),
            serial: Arc::new(Mutex::new(())),
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Number of keys, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every key whose expiry has passed; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let _guard = self.serial.lock();
        let now = Utc::now().timestamp();
        let due = self.expiries.lock().drain_due(now);

        due.iter()
            .filter(|key| self.data.remove_if(*key, |_, e| e.is_expired(now)).is_some())
            .count()
    }

    /// Run [`purge_expired`](Self::purge_expired) every `sweep_interval`
    ///
    /// Must be called from within a tokio runtime. Abort the handle to stop.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = self.config.sweep_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!(target: "tagcache::memory", purged, "Swept expired keys");
                }
            }
        })
    }

    /// Execute one command under the serial lock
    fn run(&self, command: Command) -> Result<Reply> {
        let _guard = self.serial.lock();
        self.apply(&command, Utc::now().timestamp())
    }

    /// Drop `key` if it has expired
    fn evict_if_expired(&self, key: &str, now: i64) {
        if self.data.remove_if(key, |_, e| e.is_expired(now)).is_some() {
            self.expiries.lock().remove(key);
        }
    }

    fn remove_key(&self, key: &str) -> bool {
        self.expiries.lock().remove(key);
        self.data.remove(key).is_some()
    }

    fn write_string(&self, key: &str, value: &str) {
        // A plain write discards any previous expiry
        self.expiries.lock().remove(key);
        self.data
            .insert(key.to_string(), Entry::new(Slot::Str(value.to_string())));
    }

    fn expire(&self, key: &str, timestamp: i64, now: i64) -> Reply {
        self.evict_if_expired(key, now);
        if !self.data.contains_key(key) {
            return Reply::Integer(0);
        }

        if timestamp <= now {
            self.remove_key(key);
        } else if let Some(mut entry) = self.data.get_mut(key) {
            entry.expires_at = Some(timestamp);
            drop(entry);
            self.expiries.lock().schedule(key, timestamp);
        }
        Reply::Integer(1)
    }

    fn apply(&self, command: &Command, now: i64) -> Result<Reply> {
        match command {
            Command::Get { key } => {
                self.evict_if_expired(key, now);
                match self.data.get(key).map(|e| e.slot.clone()) {
                    None => Ok(Reply::Nil),
                    Some(Slot::Str(value)) => Ok(Reply::Value(value)),
                    Some(Slot::Set(_)) => Err(CacheError::unavailable(WRONG_TYPE)),
                }
            }
            Command::MultiGet { keys } => {
                let values = keys
                    .iter()
                    .map(|key| {
                        self.evict_if_expired(key, now);
                        match self.data.get(key).as_deref() {
                            Some(Entry {
                                slot: Slot::Str(value),
                                ..
                            }) => Some(value.clone()),
                            _ => None,
                        }
                    })
                    .collect();
                Ok(Reply::Values(values))
            }
            Command::Set { key, value } => {
                self.write_string(key, value);
                Ok(Reply::Ok)
            }
            Command::MultiSet { pairs } => {
                for (key, value) in pairs {
                    self.write_string(key, value);
                }
                Ok(Reply::Ok)
            }
            Command::SetAdd { key, member } => {
                self.evict_if_expired(key, now);
                match self.data.entry(key.clone()) {
                    MapEntry::Occupied(mut occupied) => match &mut occupied.get_mut().slot {
                        Slot::Set(members) => {
                            Ok(Reply::Integer(i64::from(members.insert(member.clone()))))
                        }
                        Slot::Str(_) => Err(CacheError::unavailable(WRONG_TYPE)),
                    },
                    MapEntry::Vacant(vacant) => {
                        vacant.insert(Entry::new(Slot::Set(HashSet::from([member.clone()]))));
                        Ok(Reply::Integer(1))
                    }
                }
            }
            Command::SetMembers { key } => {
                self.evict_if_expired(key, now);
                match self.data.get(key).map(|e| e.slot.clone()) {
                    None => Ok(Reply::Members(HashSet::new())),
                    Some(Slot::Set(members)) => Ok(Reply::Members(members)),
                    Some(Slot::Str(_)) => Err(CacheError::unavailable(WRONG_TYPE)),
                }
            }
            Command::ExpireAt { key, timestamp } => Ok(self.expire(key, *timestamp, now)),
            Command::ExpireIn { key, seconds } => {
                Ok(self.expire(key, now.saturating_add(*seconds), now))
            }
            Command::DeleteKeys { keys } => {
                let mut removed = 0;
                for key in keys {
                    self.evict_if_expired(key, now);
                    if self.remove_key(key) {
                        removed += 1;
                    }
                }
                Ok(Reply::Integer(removed))
            }
            Command::Exists { key } => {
                self.evict_if_expired(key, now);
                Ok(Reply::Integer(i64::from(self.data.contains_key(key))))
            }
            Command::FlushAll => {
                self.data.clear();
                self.expiries.lock().clear();
                Ok(Reply::Ok)
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.run(Command::Get {
            key: key.to_string(),
        })?
        .into_value()
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        self.run(Command::MultiGet {
            keys: keys.to_vec(),
        })?
        .into_values()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.run(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()> {
        self.run(Command::MultiSet {
            pairs: pairs.to_vec(),
        })?;
        Ok(())
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<bool> {
        let reply = self.run(Command::SetAdd {
            key: set_key.to_string(),
            member: member.to_string(),
        })?;
        Ok(reply.as_integer()? > 0)
    }

    async fn set_members(&self, set_key: &str) -> Result<HashSet<String>> {
        self.run(Command::SetMembers {
            key: set_key.to_string(),
        })?
        .into_members()
    }

    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool> {
        let reply = self.run(Command::ExpireAt {
            key: key.to_string(),
            timestamp,
        })?;
        Ok(reply.as_integer()? > 0)
    }

    async fn expire_in(&self, key: &str, seconds: i64) -> Result<bool> {
        let reply = self.run(Command::ExpireIn {
            key: key.to_string(),
            seconds,
        })?;
        Ok(reply.as_integer()? > 0)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<u64> {
        let reply = self.run(Command::DeleteKeys {
            keys: keys.to_vec(),
        })?;
        Ok(reply.as_integer()?.max(0) as u64)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let reply = self.run(Command::Exists {
            key: key.to_string(),
        })?;
        Ok(reply.as_integer()? > 0)
    }

    async fn flush_all(&self) -> Result<()> {
        self.run(Command::FlushAll)?;
        Ok(())
    }

    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<Reply>> {
        if pipeline.is_empty() {
            return Ok(Vec::new());
        }

        trace!(target: "tagcache::memory", commands = pipeline.len(), "Executing pipeline");

        let _guard = self.serial.lock();
        let now = Utc::now().timestamp();
        let mut replies = Vec::with_capacity(pipeline.len());
        let mut first_error = None;

        // Like a server-side pipeline, a failing command does not stop the rest
        for command in pipeline.commands() {
            match self.apply(command, now) {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(replies),
        }
    }
}
