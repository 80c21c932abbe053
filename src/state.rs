use std::sync::Arc;

use crate::{
    auth::{jwt::JwtKeys, password::PasswordHasher},
    config::AppConfig,
    storage::StorageClient,
    store::Store,
};

/// Shared, read-only handles. Everything mutable sits behind `store` or `storage`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub hasher: PasswordHasher,
    pub tokens: Arc<JwtKeys>,
}

impl AppState {
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn Store>,
        storage: Arc<dyn StorageClient>,
    ) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(&config.password)?;
        let tokens = Arc::new(JwtKeys::new(&config.jwt));
        Ok(Self {
            store,
            config: Arc::new(config),
            storage,
            hasher,
            tokens,
        })
    }
}
