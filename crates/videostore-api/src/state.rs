//! Application state shared by all handlers.

use std::sync::Arc;
use videostore_storage::VideoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VideoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn VideoStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}
