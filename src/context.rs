use crate::auth::AuthStrategy;
use crate::blacklist::BlacklistSet;
use crate::config::types::AppConfig;
use crate::registry::SessionRegistry;
use std::sync::Arc;

/// Shared application context handed to every connection handler
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub registry: Arc<SessionRegistry>,
    pub blacklist: Arc<BlacklistSet>,
    pub auth: Arc<dyn AuthStrategy>,
}

impl AppContext {
    /// Wire the default key-harvesting strategy to a fresh registry.
    pub fn new(config: AppConfig, blacklist: BlacklistSet) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let auth = Arc::new(crate::auth::KeyHarvester::new(registry.clone()));
        Self {
            config: Arc::new(config),
            registry,
            blacklist: Arc::new(blacklist),
            auth,
        }
    }
}
