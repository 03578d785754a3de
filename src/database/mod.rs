//! Persistence seams.
//!
//! Each concern is a trait so the services can run against Postgres
//! ([`PgStore`]) or the process-local [`MemoryStore`].

pub mod candidatures;
pub mod directory;
pub mod hiring_requests;
pub mod memory;
pub mod notifications;
pub mod pool;

pub use candidatures::CandidatureRepository;
pub use directory::DirectoryRepository;
pub use hiring_requests::{HiringRequestRepository, TransitionRecord};
pub use memory::MemoryStore;
pub use notifications::{NotificationRepository, NotificationSink};

use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(20).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.per_page - 1) / self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    webhook_target: Option<String>,
}

impl PgStore {
    pub fn new(pool: PgPool, webhook_target: Option<String>) -> Self {
        Self {
            pool,
            webhook_target,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
