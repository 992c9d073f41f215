use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("persistent storage is not available")]
    Unavailable,
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("node already exists: {0}")]
    DuplicateNode(String),
    #[error("edge {from} -> {to} references a missing node")]
    MissingEndpoint { from: String, to: String },
}
