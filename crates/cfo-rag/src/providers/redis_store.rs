//! Redis-backed metadata store

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::MetadataConfig;
use crate::error::{Error, Result};

use super::metadata_store::MetadataStore;

/// [`MetadataStore`] holding one JSON object per chunk id
///
/// Keys are the bare chunk UUID strings; the configured database is owned
/// entirely by the pipeline, so `clear` flushes it.
pub struct RedisMetadataStore {
    conn: MultiplexedConnection,
}

impl RedisMetadataStore {
    /// Connect using the configured URL
    pub async fn connect(config: &MetadataConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::metadata(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Connected to Redis metadata store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl MetadataStore for RedisMetadataStore {
    async fn store_metadata(&self, chunk_id: &Uuid, metadata: &HashMap<String, String>) -> Result<()> {
        let value = serde_json::to_string(metadata)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(chunk_id.to_string(), value).await?;
        Ok(())
    }

    async fn get_metadata(&self, chunk_id: &Uuid) -> Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(chunk_id.to_string()).await?;

        match value {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::metadata(format!("Corrupt record for chunk {}: {}", chunk_id, e))
            }),
            None => Ok(HashMap::new()),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        tracing::info!("Flushed Redis metadata store");
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}
