use std::sync::Arc;

use common::ServiceError;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::models::ReviewStats;
use crate::store::CatalogStore;

/// Keeps `games.average_rating` in line with the game's reviews.
#[derive(Clone)]
pub struct RatingAggregator {
    store: Arc<dyn CatalogStore>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Runs after the review write has committed. The two calls are not
    /// wrapped in a transaction; a failure here leaves the review in place.
    pub async fn recompute(&self, game_id: i64) -> Result<Decimal, ServiceError> {
        let stats = self.store.review_stats(game_id).await?;
        let rating = average_rating(&stats);

        self.store.set_average_rating(game_id, rating).await?;
        debug!(game_id, count = stats.count, %rating, "average rating recomputed");

        Ok(rating)
    }
}

pub fn average_rating(stats: &ReviewStats) -> Decimal {
    match stats.mean {
        Some(mean) if stats.count > 0 => {
            mean.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        }
        _ => Decimal::ZERO,
    }
}
