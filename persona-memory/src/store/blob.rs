use crate::store::error::StoreError;

/// Opaque byte-payload store with key-prefixed listing. Raw chat transcripts
/// are the only payload this subsystem writes.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
