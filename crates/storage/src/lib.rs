#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AutoRemovePolicy, CorrectCountRepository, InMemoryStateStore, RemovalPolicyRepository,
    SessionStateRepository, Storage, StorageError,
};
