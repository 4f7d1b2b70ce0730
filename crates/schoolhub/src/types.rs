use std::sync::Arc;

use crate::db::SchoolDbManager;
use crate::server::middleware::auth::{AccessPolicy, AllowAll};

/// Shared state handed to every request handler.
pub struct AppState {
    /// The school records store.
    pub db: SchoolDbManager,
    /// Decides which callers may perform which requests.
    pub policy: Arc<dyn AccessPolicy>,
}

impl AppState {
    /// State that lets every caller through.
    pub fn new(db: SchoolDbManager) -> Self {
        Self::with_policy(db, Arc::new(AllowAll))
    }

    pub fn with_policy(db: SchoolDbManager, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { db, policy }
    }
}
