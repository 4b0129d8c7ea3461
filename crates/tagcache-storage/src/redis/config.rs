//! Configuration for the Redis store

use serde::Deserialize;
use std::time::Duration;
use url::Url;

use tagcache_core::{CacheError, Result};

/// Configuration for Redis store connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379/0")
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,

    /// Connection timeout
    pub connection_timeout: Duration,

    /// Password sent when connecting
    pub auth: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            auth: None,
        }
    }
}

impl RedisConfig {
    /// Create new config with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set pool size
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set connection timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the password
    pub fn auth(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(password.into());
        self
    }

    /// URL to connect with, carrying `auth` as its password
    pub fn connection_url(&self) -> Result<String> {
        let Some(auth) = &self.auth else {
            return Ok(self.url.clone());
        };

        let mut url = Url::parse(&self.url)
            .map_err(|e| CacheError::invalid(format!("invalid redis url: {}", e)))?;
        url.set_password(Some(auth))
            .map_err(|_| CacheError::invalid("redis url cannot carry a password"))?;
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedisConfig::default();
        assert_eq!(config.pool_size, 10);
        assert!(config.auth.is_none());
        assert_eq!(config.connection_url().unwrap(), "redis://127.0.0.1:6379");
    }

    #[test]
    fn test_builder() {
        let config = RedisConfig::new("redis://cache:6379/2")
            .pool_size(4)
            .connection_timeout(Duration::from_secs(1));
        assert_eq!(config.url, "redis://cache:6379/2");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_auth_goes_into_url() {
        let config = RedisConfig::new("redis://127.0.0.1:6379").auth("s3cr3t");
        assert_eq!(
            config.connection_url().unwrap(),
            "redis://:s3cr3t@127.0.0.1:6379"
        );
    }

    #[test]
    fn test_auth_is_percent_encoded() {
        let config = RedisConfig::new("redis://127.0.0.1:6379").auth("p@ss/w");
        assert_eq!(
            config.connection_url().unwrap(),
            "redis://:p%40ss%2Fw@127.0.0.1:6379"
        );
    }

    #[test]
    fn test_invalid_url() {
        let config = RedisConfig::new("not a url").auth("x");
        assert!(matches!(
            config.connection_url(),
            Err(CacheError::InvalidArgument(_))
        ));
    }
}
