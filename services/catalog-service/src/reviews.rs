use std::sync::Arc;

use common::validation;
use common::{
    CreateReviewRequest, GameReviews, Page, PageRequest, Review, ReviewDetail, ServiceError, UpdateReviewRequest,
};
use tracing::{info, warn};

use crate::models::{rating_to_f64, DbReview, NewReview};
use crate::rating::RatingAggregator;
use crate::store::{CatalogStore, StoreError};

fn game_not_found() -> ServiceError {
    ServiceError::NotFound("Game not found".to_string())
}

fn review_not_found() -> ServiceError {
    ServiceError::NotFound("Review not found".to_string())
}

fn duplicate_review() -> ServiceError {
    ServiceError::Conflict("You have already reviewed this game".to_string())
}

#[derive(Clone)]
pub struct ReviewsService {
    store: Arc<dyn CatalogStore>,
    aggregator: RatingAggregator,
}

impl ReviewsService {
    pub fn new(store: Arc<dyn CatalogStore>, aggregator: RatingAggregator) -> Self {
        Self { store, aggregator }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Review>, ServiceError> {
        let (reviews, total) = self.store.list_reviews(page).await?;
        let items = reviews.into_iter().map(Review::from).collect();

        Ok(Page::new(items, total, page))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ReviewDetail>, ServiceError> {
        let reviews = self.store.recent_reviews(limit).await?;
        Ok(reviews.into_iter().map(ReviewDetail::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<ReviewDetail, ServiceError> {
        self.store
            .get_review_with_game(id)
            .await?
            .map(ReviewDetail::from)
            .ok_or_else(review_not_found)
    }

    pub async fn create(&self, req: CreateReviewRequest, requester_ip: &str) -> Result<Review, ServiceError> {
        validation::validate_create_review_request(&req).map_err(ServiceError::Validation)?;

        if self.store.get_game(req.game_id).await?.is_none() {
            return Err(game_not_found());
        }

        // The unique (game_id, ip_address) constraint catches what slips past this check.
        if self.store.find_review_by_author(req.game_id, requester_ip).await?.is_some() {
            warn!(game_id = req.game_id, ip = requester_ip, "duplicate review rejected");
            return Err(duplicate_review());
        }

        let new_review = NewReview {
            game_id: req.game_id,
            rating: req.rating,
            text: req.text,
            ip_address: requester_ip.to_string(),
        };
        let record = self.store.insert_review(&new_review).await.map_err(|e| match e {
            StoreError::Duplicate(_) => duplicate_review(),
            StoreError::MissingReference(_) => game_not_found(),
            other => other.into(),
        })?;
        info!(review_id = record.id, game_id = record.game_id, "review created");

        self.aggregator.recompute(record.game_id).await?;

        Ok(record.into())
    }

    pub async fn update(&self, id: i64, req: UpdateReviewRequest, requester_ip: &str) -> Result<Review, ServiceError> {
        if req.is_empty() {
            return Err(ServiceError::BadRequest("No fields to update".to_string()));
        }
        validation::validate_update_review_request(&req).map_err(ServiceError::Validation)?;

        let existing = self.owned_review(id, requester_ip).await?;

        let record = self
            .store
            .update_review(id, requester_ip, &req)
            .await?
            .ok_or_else(review_not_found)?;
        info!(review_id = id, game_id = existing.game_id, "review updated");

        self.aggregator.recompute(existing.game_id).await?;

        Ok(record.into())
    }

    pub async fn delete(&self, id: i64, requester_ip: &str) -> Result<(), ServiceError> {
        let existing = self.owned_review(id, requester_ip).await?;

        if !self.store.delete_review(id, requester_ip).await? {
            return Err(review_not_found());
        }
        info!(review_id = id, game_id = existing.game_id, "review deleted");

        self.aggregator.recompute(existing.game_id).await?;

        Ok(())
    }

    pub async fn for_game(&self, game_id: i64) -> Result<GameReviews, ServiceError> {
        let game = self.store.get_game(game_id).await?.ok_or_else(game_not_found)?;
        let items: Vec<ReviewDetail> = self
            .store
            .reviews_for_game(game_id)
            .await?
            .into_iter()
            .map(ReviewDetail::from)
            .collect();

        Ok(GameReviews {
            game_id,
            game_title: game.title,
            average_rating: rating_to_f64(game.average_rating),
            reviews_count: items.len() as i64,
            items,
        })
    }

    /// Loads a review and checks that `requester_ip` wrote it.
    async fn owned_review(&self, id: i64, requester_ip: &str) -> Result<DbReview, ServiceError> {
        let review = self.store.get_review(id).await?.ok_or_else(review_not_found)?;

        if review.ip_address != requester_ip {
            warn!(review_id = id, ip = requester_ip, "review mutation from foreign address rejected");
            return Err(ServiceError::Forbidden("Access denied".to_string()));
        }

        Ok(review)
    }
}
