use std::sync::Arc;

use crate::application::DocumentStoreClient;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStoreClient>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: DocumentStoreClient, config: AppConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}
