use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Property {key} is not writable")]
    NotWritable { key: String },

    #[error("Property {key} is not readable")]
    NotReadable { key: String },

    #[error("Memory group does not accept new items")]
    ReadOnlyGroup,

    #[error("Key {key} already exists")]
    DuplicateKey { key: String },

    #[error("Key {key} is reserved")]
    ReservedKey { key: String },

    #[error("Invalid memory path: '{path}'")]
    InvalidPath { path: String },

    #[error("Path {path} passes through {segment}, which holds no value")]
    NullReference { path: String, segment: String },

    #[error("Layer keys conflict with keys already on the stack: {}", .keys.join(", "))]
    LayerConflict { keys: Vec<String> },
}

pub type MemoryResult<T> = Result<T, MemoryError>;
