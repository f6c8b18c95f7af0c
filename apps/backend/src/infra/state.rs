use std::sync::Arc;

use db_infra::config::db::{DbKind, RuntimeEnv};
use db_infra::bootstrap_db;
use tracing::info;

use crate::adapters::{MemoryGroupStore, SeaGroupStore};
use crate::config::SignupConfig;
use crate::error::AppError;
use crate::repos::groups::GroupStore;
use crate::services::groups::GroupService;
use crate::state::app_state::AppState;

/// Builder for `AppState`, used by `main` and by tests.
///
/// Without `with_db` or `with_store` the state runs on an empty
/// `MemoryGroupStore`.
pub struct StateBuilder {
    env: RuntimeEnv,
    db_kind: Option<DbKind>,
    store: Option<Arc<dyn GroupStore>>,
    config: SignupConfig,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            env: RuntimeEnv::Test,
            db_kind: None,
            store: None,
            config: SignupConfig::default(),
        }
    }

    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    /// Connect, migrate and back the service with SQL.
    pub fn with_db(mut self, db_kind: DbKind) -> Self {
        self.db_kind = Some(db_kind);
        self
    }

    /// Use a ready-made store. Takes precedence over `with_db`.
    pub fn with_store(mut self, store: Arc<dyn GroupStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: SignupConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let (store, db): (Arc<dyn GroupStore>, _) = match (self.store, self.db_kind) {
            (Some(store), _) => (store, None),
            (None, Some(db_kind)) => {
                let conn = bootstrap_db(self.env, db_kind).await?;
                info!(env = ?self.env, db_kind = ?db_kind, "Group store connected");
                (Arc::new(SeaGroupStore::new(conn.clone())), Some(conn))
            }
            (None, None) => (Arc::new(MemoryGroupStore::new()), None),
        };

        let groups = GroupService::new(
            store,
            self.config.max_txn_attempts,
            self.config.page_size,
        );
        Ok(AppState::new(self.config, groups, db))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
