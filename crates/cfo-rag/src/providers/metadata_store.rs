//! Metadata store trait mapping chunk ids to content and provenance

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;
use crate::error::Result;

/// Key-value store for chunk records
///
/// Implementations:
/// - `RedisMetadataStore`: Redis, one JSON value per chunk id
/// - `InMemoryMetadataStore`: process-local map
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Store a record, replacing any previous value
    async fn store_metadata(&self, chunk_id: &Uuid, metadata: &HashMap<String, String>) -> Result<()>;

    /// Fetch a record; an unknown id yields an empty map
    async fn get_metadata(&self, chunk_id: &Uuid) -> Result<HashMap<String, String>>;

    /// Remove every record
    async fn clear(&self) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
