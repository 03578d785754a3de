pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod workflow;

use crate::config::Config;
use crate::database::{
    CandidatureRepository, DirectoryRepository, HiringRequestRepository, NotificationRepository,
    NotificationSink, PgStore,
};
use crate::services::{
    hiring_request_service::HiringRequestService, workflow_service::WorkflowService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub hiring_request_service: HiringRequestService,
    pub workflow_service: WorkflowService,
    pub directory: Arc<dyn DirectoryRepository>,
    pub candidatures: Arc<dyn CandidatureRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let store = Arc::new(PgStore::new(pool, config.notification_webhook_url.clone()));
        Self::with_store(store, &config.jwt_secret)
    }

    /// Wires every service onto a single store implementing all repositories.
    pub fn with_store<S>(store: Arc<S>, jwt_secret: &str) -> Self
    where
        S: HiringRequestRepository
            + DirectoryRepository
            + CandidatureRepository
            + NotificationRepository
            + NotificationSink
            + 'static,
    {
        let hiring_request_service =
            HiringRequestService::new(store.clone(), store.clone(), store.clone());
        let workflow_service = WorkflowService::new(store.clone(), store.clone(), store.clone());

        Self {
            hiring_request_service,
            workflow_service,
            directory: store.clone(),
            candidatures: store.clone(),
            notifications: store,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
