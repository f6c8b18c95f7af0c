use sea_orm::DatabaseConnection;

use crate::config::SignupConfig;
use crate::services::groups::GroupService;

/// Shared state handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: SignupConfig,
    pub groups: GroupService,
    /// Set when the group store is SQL-backed; health checks ping it
    db: Option<DatabaseConnection>,
}

impl AppState {
    pub fn new(config: SignupConfig, groups: GroupService, db: Option<DatabaseConnection>) -> Self {
        Self { config, groups, db }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
