use std::sync::Arc;

use crate::services::{catalog::Catalog, ranking::RankingConfig};

/// Shared application state.
///
/// The catalog snapshot and ranking configuration are read-only after
/// startup, so handlers share them without locking.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub ranking: Arc<RankingConfig>,
}

impl AppState {
    /// Creates state with the default ranking configuration
    pub fn new(catalog: Catalog) -> Self {
        Self::with_ranking(catalog, RankingConfig::default())
    }

    pub fn with_ranking(catalog: Catalog, ranking: RankingConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            ranking: Arc::new(ranking),
        }
    }
}
