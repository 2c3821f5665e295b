pub mod chat_store;
pub mod minio_client;
pub mod storage_manager;

pub use chat_store::{ChatStore, InMemoryChatStore, StoreError};
pub use minio_client::MinioChatStore;
pub use storage_manager::StorageManager;
