use async_trait::async_trait;
use common::{CreateGameRequest, GameFilter, PageRequest, ServiceError, UpdateGameRequest, UpdateReviewRequest};
use sqlx::types::Decimal;
use thiserror::Error;

use crate::models::{DbGame, DbReview, DbReviewWithGame, GameOrder, NewReview, ReviewStats};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate row: {0}")]
    Duplicate(String),
    #[error("referenced row is missing: {0}")]
    MissingReference(String),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::MissingReference(db.message().to_string())
            }
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) | StoreError::MissingReference(msg) | StoreError::Rejected(msg) => {
                ServiceError::BadRequest(msg)
            }
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
        }
    }
}

/// Data access for the `games` and `reviews` tables.
///
/// Every call maps to one round trip to the database. Lookups return `None`
/// when the row does not exist; conditional writes return `None`/`false`
/// when nothing matched.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_games(&self, filter: &GameFilter, page: PageRequest) -> Result<(Vec<DbGame>, i64), StoreError>;
    async fn get_game(&self, id: i64) -> Result<Option<DbGame>, StoreError>;
    async fn insert_game(&self, game: &CreateGameRequest) -> Result<DbGame, StoreError>;
    async fn update_game(&self, id: i64, changes: &UpdateGameRequest) -> Result<Option<DbGame>, StoreError>;
    async fn delete_game(&self, id: i64) -> Result<bool, StoreError>;
    async fn ordered_games(&self, order: GameOrder, limit: i64) -> Result<Vec<DbGame>, StoreError>;
    async fn distinct_genres(&self) -> Result<Vec<String>, StoreError>;
    async fn distinct_platforms(&self) -> Result<Vec<String>, StoreError>;
    async fn set_average_rating(&self, game_id: i64, rating: Decimal) -> Result<(), StoreError>;

    async fn list_reviews(&self, page: PageRequest) -> Result<(Vec<DbReview>, i64), StoreError>;
    async fn recent_reviews(&self, limit: i64) -> Result<Vec<DbReviewWithGame>, StoreError>;
    async fn get_review(&self, id: i64) -> Result<Option<DbReview>, StoreError>;
    async fn get_review_with_game(&self, id: i64) -> Result<Option<DbReviewWithGame>, StoreError>;
    async fn find_review_by_author(&self, game_id: i64, ip_address: &str) -> Result<Option<DbReview>, StoreError>;
    async fn insert_review(&self, review: &NewReview) -> Result<DbReview, StoreError>;
    /// Updates only when both `id` and `ip_address` match.
    async fn update_review(&self, id: i64, ip_address: &str, changes: &UpdateReviewRequest) -> Result<Option<DbReview>, StoreError>;
    /// Deletes only when both `id` and `ip_address` match.
    async fn delete_review(&self, id: i64, ip_address: &str) -> Result<bool, StoreError>;
    async fn reviews_for_game(&self, game_id: i64) -> Result<Vec<DbReviewWithGame>, StoreError>;
    async fn count_reviews(&self, game_id: i64) -> Result<i64, StoreError>;
    async fn review_stats(&self, game_id: i64) -> Result<ReviewStats, StoreError>;
}
