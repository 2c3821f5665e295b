pub mod config;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod server;
pub mod storage;
