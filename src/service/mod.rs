mod data_service;
mod retry;

pub use data_service::{
    CatalogDataService, DataServiceConfig, ServiceStatus, MAX_QUERY_LEN,
};
pub use retry::RetryPolicy;
