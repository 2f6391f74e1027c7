use std::sync::Arc;

use anyhow::Result;
use salvo::prelude::*;
use tracing::info;

use crate::chat::ChatAssistant;
use crate::config::Config;
use crate::quiz::RiskAssessor;
use crate::scan::ScanService;

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;

use self::error::ApiError;
use self::middleware::cors::cors_handler;
use self::router::create_router;

#[derive(Clone)]
pub struct WebState {
    pub scans: Arc<ScanService>,
    pub assessor: Arc<RiskAssessor>,
    pub chat: Arc<ChatAssistant>,
    pub max_body_bytes: usize,
}

pub fn web_state(depot: &Depot) -> Result<&WebState, ApiError> {
    depot
        .obtain::<WebState>()
        .map_err(|_| ApiError::internal("web state is not initialized"))
}

pub fn build_service(state: WebState, cors_origins: &[String]) -> Service {
    Service::new(create_router(state)).hoop(cors_handler(cors_origins))
}

#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
    state: WebState,
}

impl WebServer {
    pub fn new(config: Arc<Config>, state: WebState) -> Self {
        Self { config, state }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("Starting web server on {}", bind_addr);

        let service = build_service(self.state.clone(), &self.config.server.cors_origins);
        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor).serve(service).await;

        Ok(())
    }
}
