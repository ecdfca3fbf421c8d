use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::EngineConfig;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db: Arc<Database>,
    engine: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(db: Arc<Database>, engine: EngineConfig) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db,
            engine: Arc::new(engine),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }
}
