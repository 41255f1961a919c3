// Application state module
// Process-lifetime context handed to every request

use std::sync::Arc;

use super::types::Config;
use crate::geocode::{BoundaryStore, ColumnWhitelist};

/// Application state
///
/// Built once before the listener is bound and never mutated afterwards, so
/// it is shared between connections without locking.
pub struct AppState {
    pub config: Config,
    pub columns: ColumnWhitelist,
    pub store: Arc<dyn BoundaryStore>,
}

impl AppState {
    pub fn new(config: Config, columns: ColumnWhitelist, store: Arc<dyn BoundaryStore>) -> Self {
        Self {
            config,
            columns,
            store,
        }
    }
}
