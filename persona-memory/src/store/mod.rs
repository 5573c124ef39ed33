pub mod attr;
pub mod blob;
pub mod document;
pub mod dynamodb;
pub mod error;
pub mod memory;
pub mod s3;

pub use blob::BlobStore;
pub use document::{DocumentKey, DocumentStore, Patch, Query};
pub use dynamodb::DynamoDocumentStore;
pub use error::StoreError;
pub use memory::{InMemoryBlobStore, InMemoryDocumentStore};
pub use s3::S3BlobStore;
