//! Store commands, replies and the pipeline that batches them

use std::collections::HashSet;

use crate::{CacheError, Result};

/// A single primitive store command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: String },
    MultiGet { keys: Vec<String> },
    Set { key: String, value: String },
    MultiSet { pairs: Vec<(String, String)> },
    SetAdd { key: String, member: String },
    SetMembers { key: String },
    ExpireAt { key: String, timestamp: i64 },
    ExpireIn { key: String, seconds: i64 },
    DeleteKeys { keys: Vec<String> },
    Exists { key: String },
    FlushAll,
}

impl Command {
    /// Wire name of the command, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "GET",
            Command::MultiGet { .. } => "MGET",
            Command::Set { .. } => "SET",
            Command::MultiSet { .. } => "MSET",
            Command::SetAdd { .. } => "SADD",
            Command::SetMembers { .. } => "SMEMBERS",
            Command::ExpireAt { .. } => "EXPIREAT",
            Command::ExpireIn { .. } => "EXPIRE",
            Command::DeleteKeys { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::FlushAll => "FLUSHDB",
        }
    }
}

/// Result of one executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// No value (missing key)
    Nil,
    /// Status acknowledgement
    Ok,
    /// Integer reply (counts and boolean flags)
    Integer(i64),
    /// Single value
    Value(String),
    /// Ordered values of a multi-get
    Values(Vec<Option<String>>),
    /// Members of a set
    Members(HashSet<String>),
}

impl Reply {
    /// Interpret as an optional single value
    pub fn into_value(self) -> Result<Option<String>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Value(v) => Ok(Some(v)),
            other => Err(unexpected("value", &other)),
        }
    }

    /// Interpret as the slots of a multi-get
    pub fn into_values(self) -> Result<Vec<Option<String>>> {
        match self {
            Reply::Values(values) => Ok(values),
            other => Err(unexpected("values", &other)),
        }
    }

    /// Interpret as set members; a missing set has no members
    pub fn into_members(self) -> Result<HashSet<String>> {
        match self {
            Reply::Members(members) => Ok(members),
            Reply::Nil => Ok(HashSet::new()),
            other => Err(unexpected("members", &other)),
        }
    }

    /// Interpret as an integer
    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Reply::Integer(n) => Ok(*n),
            other => Err(unexpected("integer", other)),
        }
    }
}

fn unexpected(wanted: &str, got: &Reply) -> CacheError {
    CacheError::StoreUnavailable(format!("expected {} reply, got {:?}", wanted, got))
}

/// Commands queued client-side and sent in one round trip
///
/// Nothing is sent until the pipeline is handed to
/// [`KeyValueStore::execute`](crate::KeyValueStore::execute).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arbitrary command
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn get(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::Get { key: key.into() })
    }

    pub fn multi_get(&mut self, keys: Vec<String>) -> &mut Self {
        self.push(Command::MultiGet { keys })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn multi_set(&mut self, pairs: Vec<(String, String)>) -> &mut Self {
        self.push(Command::MultiSet { pairs })
    }

    pub fn set_add(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(Command::SetAdd {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn set_members(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::SetMembers { key: key.into() })
    }

    pub fn expire_at(&mut self, key: impl Into<String>, timestamp: i64) -> &mut Self {
        self.push(Command::ExpireAt {
            key: key.into(),
            timestamp,
        })
    }

    pub fn expire_in(&mut self, key: impl Into<String>, seconds: i64) -> &mut Self {
        self.push(Command::ExpireIn {
            key: key.into(),
            seconds,
        })
    }

    pub fn delete_keys(&mut self, keys: Vec<String>) -> &mut Self {
        self.push(Command::DeleteKeys { keys })
    }

    pub fn exists(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::Exists { key: key.into() })
    }

    pub fn flush_all(&mut self) -> &mut Self {
        self.push(Command::FlushAll)
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
