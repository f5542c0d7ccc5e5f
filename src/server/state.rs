use axum::extract::FromRef;

use std::sync::Arc;
use std::time::Instant;

use crate::service::CatalogDataService;
use crate::tools::ToolRegistry;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub service: Arc<CatalogDataService>,
    pub registry: Arc<ToolRegistry>,
}

impl FromRef<ServerState> for Arc<CatalogDataService> {
    fn from_ref(input: &ServerState) -> Self {
        input.service.clone()
    }
}

impl FromRef<ServerState> for Arc<ToolRegistry> {
    fn from_ref(input: &ServerState) -> Self {
        input.registry.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
