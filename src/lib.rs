pub mod cache;
pub mod catalog;
pub mod error;
pub mod metrics;
pub mod rate_limit;
pub mod schema;
pub mod search;
pub mod server;
pub mod service;
pub mod tools;

pub use error::{CatalogError, Result};
