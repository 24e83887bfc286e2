use std::sync::Arc;

use crate::config::Config;
use crate::games::GamesService;
use crate::rating::RatingAggregator;
use crate::reviews::ReviewsService;
use crate::store::CatalogStore;

/// Shared by every handler. The store handle lives as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub games: GamesService,
    pub reviews: ReviewsService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn CatalogStore>) -> Self {
        let aggregator = RatingAggregator::new(store.clone());

        Self {
            config: Arc::new(config),
            games: GamesService::new(store.clone()),
            reviews: ReviewsService::new(store, aggregator),
        }
    }
}
