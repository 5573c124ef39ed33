use anyhow::anyhow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(anyhow::Error),

    #[error("Decode error: {0}")]
    Decode(anyhow::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode(anyhow!(source))
    }
}
