use crate::config::Config;
use crate::services::storage::ObjectStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: Arc<ObjectStore>,
    pub config: Arc<Config>,
}
