use chrono::{DateTime, Utc};
use common::{Game, Review, ReviewDetail, ReviewGame};
use num_traits::{FromPrimitive, ToPrimitive};
use sqlx::types::Decimal;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbGame {
     pub id: i64,
     pub title: String,
     pub description: Option<String>,
     pub genres: Vec<String>,
     pub developer: Option<String>,
     pub publisher: Option<String>,
     pub release_year: i32,
     pub platforms: Vec<String>,
     pub cover_image_path: Option<String>,
     pub average_rating: Decimal,
     pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbReview {
     pub id: i64,
     pub game_id: i64,
     pub rating: i32,
     pub text: String,
     pub ip_address: String,
     pub created_at: DateTime<Utc>,
}

/// Review row joined with the title of its game.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbReviewWithGame {
     pub id: i64,
     pub game_id: i64,
     pub rating: i32,
     pub text: String,
     pub ip_address: String,
     pub created_at: DateTime<Utc>,
     pub game_title: String,
}

#[derive(Debug, Clone)]
pub struct NewReview {
     pub game_id: i64,
     pub rating: i32,
     pub text: String,
     pub ip_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ReviewStats {
     pub count: i64,
     pub mean: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOrder {
     TopRated,
     Recent,
}

pub fn rating_to_f64(rating: Decimal) -> f64 {
     rating.to_f64().unwrap_or_default()
}

impl From<DbGame> for Game {
     fn from(game: DbGame) -> Self {
          Game {
               id: game.id,
               title: game.title,
               description: game.description,
               genres: game.genres,
               developer: game.developer,
               publisher: game.publisher,
               release_year: game.release_year,
               platforms: game.platforms,
               cover_image_path: game.cover_image_path,
               average_rating: rating_to_f64(game.average_rating),
               created_at: game.created_at,
          }
     }
}

impl From<DbReview> for Review {
     fn from(review: DbReview) -> Self {
          Review {
               id: review.id,
               game_id: review.game_id,
               rating: review.rating,
               text: review.text,
               ip_address: review.ip_address,
               created_at: review.created_at,
          }
     }
}

impl From<DbReviewWithGame> for ReviewDetail {
     fn from(row: DbReviewWithGame) -> Self {
          ReviewDetail {
               id: row.id,
               rating: row.rating,
               text: row.text,
               ip_address: row.ip_address,
               created_at: row.created_at,
               game: ReviewGame {
                    id: row.game_id,
                    title: row.game_title,
               },
          }
     }
}

/// Converts a client supplied rating bound; non-finite input maps to zero.
pub fn rating_from_f64(rating: f64) -> Decimal {
     Decimal::from_f64(rating).unwrap_or_default()
}
