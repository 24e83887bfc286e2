use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use common::{CreateGameRequest, GameFilter, PageRequest, UpdateGameRequest, UpdateReviewRequest};
use sqlx::types::Decimal;

use crate::models::{rating_from_f64, DbGame, DbReview, DbReviewWithGame, GameOrder, NewReview, ReviewStats};
use crate::store::{CatalogStore, StoreError};

/// In-process store with the same query semantics as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct Tables {
    games: Vec<DbGame>,
    reviews: Vec<DbReview>,
    next_game_id: i64,
    next_review_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock_tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("poisoned lock".to_string()))
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

fn has_all_ci(values: &[String], wanted: &[String]) -> bool {
    wanted
        .iter()
        .all(|w| values.iter().any(|v| v.to_lowercase() == w.to_lowercase()))
}

fn matches_filter(game: &DbGame, filter: &GameFilter) -> bool {
    if let Some(q) = filter.search_term() {
        if !contains_ci(Some(&game.title), q) {
            return false;
        }
    }
    if !has_all_ci(&game.genres, &filter.genre_list()) || !has_all_ci(&game.platforms, &filter.platform_list()) {
        return false;
    }
    if let Some(developer) = filter.developer_term() {
        if !contains_ci(game.developer.as_deref(), developer) {
            return false;
        }
    }
    if let Some(publisher) = filter.publisher_term() {
        if !contains_ci(game.publisher.as_deref(), publisher) {
            return false;
        }
    }
    if filter.min_rating.is_some_and(|min| game.average_rating < rating_from_f64(min)) {
        return false;
    }
    if filter.max_rating.is_some_and(|max| game.average_rating > rating_from_f64(max)) {
        return false;
    }
    if filter.min_year.is_some_and(|min| game.release_year < min) {
        return false;
    }
    if filter.max_year.is_some_and(|max| game.release_year > max) {
        return false;
    }
    true
}

fn paginate<T: Clone>(rows: &[T], page: PageRequest) -> Vec<T> {
    rows.iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

fn join_game(tables: &Tables, review: &DbReview) -> Option<DbReviewWithGame> {
    let game = tables.games.iter().find(|g| g.id == review.game_id)?;
    Some(DbReviewWithGame {
        id: review.id,
        game_id: review.game_id,
        rating: review.rating,
        text: review.text.clone(),
        ip_address: review.ip_address.clone(),
        created_at: review.created_at,
        game_title: game.title.clone(),
    })
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock_tables().map(|_| ())
    }

    async fn list_games(&self, filter: &GameFilter, page: PageRequest) -> Result<(Vec<DbGame>, i64), StoreError> {
        let tables = self.lock_tables()?;
        let matching: Vec<DbGame> = tables
            .games
            .iter()
            .filter(|g| matches_filter(g, filter))
            .cloned()
            .collect();
        Ok((paginate(&matching, page), matching.len() as i64))
    }

    async fn get_game(&self, id: i64) -> Result<Option<DbGame>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(tables.games.iter().find(|g| g.id == id).cloned())
    }

    async fn insert_game(&self, game: &CreateGameRequest) -> Result<DbGame, StoreError> {
        let mut tables = self.lock_tables()?;
        tables.next_game_id += 1;
        let record = DbGame {
            id: tables.next_game_id,
            title: game.title.clone(),
            description: game.description.clone(),
            genres: game.genres.clone(),
            developer: game.developer.clone(),
            publisher: game.publisher.clone(),
            release_year: game.release_year,
            platforms: game.platforms.clone(),
            cover_image_path: game.cover_image_path.clone(),
            average_rating: Decimal::ZERO,
            created_at: Utc::now(),
        };
        tables.games.push(record.clone());
        Ok(record)
    }

    async fn update_game(&self, id: i64, changes: &UpdateGameRequest) -> Result<Option<DbGame>, StoreError> {
        let mut tables = self.lock_tables()?;
        let Some(game) = tables.games.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(Some(title)) = &changes.title {
            game.title = title.clone();
        }
        if let Some(description) = &changes.description {
            game.description = description.clone();
        }
        if let Some(Some(genres)) = &changes.genres {
            game.genres = genres.clone();
        }
        if let Some(developer) = &changes.developer {
            game.developer = developer.clone();
        }
        if let Some(publisher) = &changes.publisher {
            game.publisher = publisher.clone();
        }
        if let Some(Some(year)) = changes.release_year {
            game.release_year = year;
        }
        if let Some(Some(platforms)) = &changes.platforms {
            game.platforms = platforms.clone();
        }
        if let Some(path) = &changes.cover_image_path {
            game.cover_image_path = path.clone();
        }
        Ok(Some(game.clone()))
    }

    async fn delete_game(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock_tables()?;
        let before = tables.games.len();
        tables.games.retain(|g| g.id != id);
        let deleted = tables.games.len() < before;
        if deleted {
            tables.reviews.retain(|r| r.game_id != id);
        }
        Ok(deleted)
    }

    async fn ordered_games(&self, order: GameOrder, limit: i64) -> Result<Vec<DbGame>, StoreError> {
        let tables = self.lock_tables()?;
        let mut games = tables.games.clone();
        match order {
            GameOrder::TopRated => games.sort_by(|a, b| b.average_rating.cmp(&a.average_rating).then(a.id.cmp(&b.id))),
            GameOrder::Recent => games.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
        }
        games.truncate(limit as usize);
        Ok(games)
    }

    async fn distinct_genres(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(distinct(tables.games.iter().flat_map(|g| g.genres.clone())))
    }

    async fn distinct_platforms(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(distinct(tables.games.iter().flat_map(|g| g.platforms.clone())))
    }

    async fn set_average_rating(&self, game_id: i64, rating: Decimal) -> Result<(), StoreError> {
        let mut tables = self.lock_tables()?;
        if let Some(game) = tables.games.iter_mut().find(|g| g.id == game_id) {
            game.average_rating = rating;
        }
        Ok(())
    }

    async fn list_reviews(&self, page: PageRequest) -> Result<(Vec<DbReview>, i64), StoreError> {
        let tables = self.lock_tables()?;
        Ok((paginate(&tables.reviews, page), tables.reviews.len() as i64))
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<DbReviewWithGame>, StoreError> {
        let tables = self.lock_tables()?;
        let mut reviews: Vec<DbReviewWithGame> = tables
            .reviews
            .iter()
            .filter_map(|r| join_game(&tables, r))
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reviews.truncate(limit as usize);
        Ok(reviews)
    }

    async fn get_review(&self, id: i64) -> Result<Option<DbReview>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(tables.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn get_review_with_game(&self, id: i64) -> Result<Option<DbReviewWithGame>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| join_game(&tables, r)))
    }

    async fn find_review_by_author(&self, game_id: i64, ip_address: &str) -> Result<Option<DbReview>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.game_id == game_id && r.ip_address == ip_address)
            .cloned())
    }

    async fn insert_review(&self, review: &NewReview) -> Result<DbReview, StoreError> {
        let mut tables = self.lock_tables()?;
        if !tables.games.iter().any(|g| g.id == review.game_id) {
            return Err(StoreError::MissingReference(format!("game {} does not exist", review.game_id)));
        }
        if tables
            .reviews
            .iter()
            .any(|r| r.game_id == review.game_id && r.ip_address == review.ip_address)
        {
            return Err(StoreError::Duplicate("reviews_game_id_ip_address_key".to_string()));
        }
        tables.next_review_id += 1;
        let record = DbReview {
            id: tables.next_review_id,
            game_id: review.game_id,
            rating: review.rating,
            text: review.text.clone(),
            ip_address: review.ip_address.clone(),
            created_at: Utc::now(),
        };
        tables.reviews.push(record.clone());
        Ok(record)
    }

    async fn update_review(&self, id: i64, ip_address: &str, changes: &UpdateReviewRequest) -> Result<Option<DbReview>, StoreError> {
        let mut tables = self.lock_tables()?;
        let Some(review) = tables
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.ip_address == ip_address)
        else {
            return Ok(None);
        };
        if let Some(rating) = changes.rating {
            review.rating = rating;
        }
        if let Some(text) = &changes.text {
            review.text = text.clone();
        }
        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, id: i64, ip_address: &str) -> Result<bool, StoreError> {
        let mut tables = self.lock_tables()?;
        let before = tables.reviews.len();
        tables.reviews.retain(|r| !(r.id == id && r.ip_address == ip_address));
        Ok(tables.reviews.len() < before)
    }

    async fn reviews_for_game(&self, game_id: i64) -> Result<Vec<DbReviewWithGame>, StoreError> {
        let tables = self.lock_tables()?;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.game_id == game_id)
            .filter_map(|r| join_game(&tables, r))
            .collect())
    }

    async fn count_reviews(&self, game_id: i64) -> Result<i64, StoreError> {
        let tables = self.lock_tables()?;
        Ok(tables.reviews.iter().filter(|r| r.game_id == game_id).count() as i64)
    }

    async fn review_stats(&self, game_id: i64) -> Result<ReviewStats, StoreError> {
        let tables = self.lock_tables()?;
        let ratings: Vec<i32> = tables
            .reviews
            .iter()
            .filter(|r| r.game_id == game_id)
            .map(|r| r.rating)
            .collect();
        let count = ratings.len() as i64;
        let mean = (count > 0).then(|| {
            let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
            Decimal::from(sum) / Decimal::from(count)
        });
        Ok(ReviewStats { count, mean })
    }
}
