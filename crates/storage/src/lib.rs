pub mod db;
pub mod dto;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use db::Database;
pub use error::{Result, StorageError};
