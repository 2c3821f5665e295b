pub mod chat;
pub mod data_models;
pub mod features;

pub use chat::*;
pub use data_models::*;
pub use features::*;
