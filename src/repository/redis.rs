use crate::config::config::Config;
use crate::repository::redis::MobcError::{RedisCMDError, RedisPoolError, RedisTypeError};
use async_trait::async_trait;
use mobc::{Connection, Pool};
use mobc_redis::{redis, redis::AsyncCommands, RedisConnectionManager};
use std::time::Duration;
use thiserror::Error;

pub type MobcPool = Pool<RedisConnectionManager>;
pub type MobcConn = Connection<RedisConnectionManager>;
type Result<T> = std::result::Result<T, CacheError>;

const CACHE_POOL_MAX_OPEN: u64 = 16;
const CACHE_POOL_MAX_IDLE: u64 = 8;
const CACHE_POOL_TIMEOUT_SECONDS: u64 = 1;
const CACHE_POOL_EXPIRE_SECONDS: u64 = 60;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("mobc error: {0}")]
    MobcError(#[from] MobcError),
}

#[derive(Error, Debug)]
pub enum MobcError {
    #[error("could not get redis connection from pool : {0}")]
    RedisPoolError(mobc::Error<redis::RedisError>),
    #[error("error parsing string from redis result: {0}")]
    RedisTypeError(redis::RedisError),
    #[error("error executing redis command: {0}")]
    RedisCMDError(redis::RedisError),
    #[error("error creating Redis client: {0}")]
    RedisClientError(redis::RedisError),
}

/// Key-value store with expiry used to track live token correlation ids.
/// Presence of a key means the token has not been revoked; the value is the
/// signed token string it was registered with.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// SET followed by EXPIREAT. The two commands are not atomic with each
    /// other; a crash in between leaves a key without an expiry.
    async fn set(&self, key: &str, value: &str, expire_at_unix: i64) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

pub struct Redis {
    pool: MobcPool,
}

impl Redis {
    pub fn new(config: &Config) -> Self {
        let client = redis::Client::open(config.redis_url.to_owned())
            .map_err(MobcError::RedisClientError)
            .expect("Failed to open redis client");
        let manager = RedisConnectionManager::new(client);
        let pool = Pool::builder()
            .get_timeout(Some(Duration::from_secs(CACHE_POOL_TIMEOUT_SECONDS)))
            .max_open(CACHE_POOL_MAX_OPEN)
            .max_idle(CACHE_POOL_MAX_IDLE)
            .max_lifetime(Some(Duration::from_secs(CACHE_POOL_EXPIRE_SECONDS)))
            .build(manager);

        Redis { pool }
    }

    async fn get_conn(&self) -> Result<MobcConn> {
        self.pool.get().await.map_err(|e| {
            log::error!("error connecting to redis: {}", e);
            RedisPoolError(e).into()
        })
    }
}

#[async_trait]
impl CacheStore for Redis {
    async fn set(&self, key: &str, value: &str, expire_at_unix: i64) -> Result<()> {
        let mut con = self.get_conn().await?;
        let _: () = con.set(key, value).await.map_err(RedisCMDError)?;
        if expire_at_unix > 0 {
            let _: i64 = con
                .expire_at(key, expire_at_unix as usize)
                .await
                .map_err(RedisCMDError)?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.get_conn().await?;
        let value = con.get(key).await.map_err(RedisCMDError)?;
        redis::FromRedisValue::from_redis_value(&value).map_err(|e| RedisTypeError(e).into())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut con = self.get_conn().await?;
        let _: i64 = con.del(key).await.map_err(RedisCMDError)?;
        Ok(())
    }
}
