use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub mod models {
    use super::*;
    use serde_with::rust::double_option;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Game {
        pub id: i64,
        pub title: String,
        pub description: Option<String>,
        pub genres: Vec<String>,
        pub developer: Option<String>,
        pub publisher: Option<String>,
        pub release_year: i32,
        pub platforms: Vec<String>,
        pub cover_image_path: Option<String>,
        pub average_rating: f64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GameDetail {
        #[serde(flatten)]
        pub game: Game,
        pub reviews_count: i64,
    }

    /// Body of `POST /games`. `average_rating` is never taken from the client.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CreateGameRequest {
        pub title: String,
        pub description: Option<String>,
        #[serde(default)]
        pub genres: Vec<String>,
        pub developer: Option<String>,
        pub publisher: Option<String>,
        pub release_year: i32,
        #[serde(default)]
        pub platforms: Vec<String>,
        pub cover_image_path: Option<String>,
    }

    /// Body of `PATCH /games/{id}`.
    ///
    /// The outer `Option` tells whether the field was sent at all; `Some(None)`
    /// is an explicit `null`, which clears a nullable column.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct UpdateGameRequest {
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub title: Option<Option<String>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub description: Option<Option<String>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub genres: Option<Option<Vec<String>>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub developer: Option<Option<String>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub publisher: Option<Option<String>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub release_year: Option<Option<i32>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub platforms: Option<Option<Vec<String>>>,
        #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
        pub cover_image_path: Option<Option<String>>,
    }

    impl UpdateGameRequest {
        pub fn is_empty(&self) -> bool {
            self.title.is_none()
                && self.description.is_none()
                && self.genres.is_none()
                && self.developer.is_none()
                && self.publisher.is_none()
                && self.release_year.is_none()
                && self.platforms.is_none()
                && self.cover_image_path.is_none()
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct GameFilter {
        pub q: Option<String>,
        /// Comma separated, e.g. `shooter,action`.
        pub genres: Option<String>,
        /// Comma separated, e.g. `pc,ps5`.
        pub platforms: Option<String>,
        pub developer: Option<String>,
        pub publisher: Option<String>,
        pub min_rating: Option<f64>,
        pub max_rating: Option<f64>,
        pub min_year: Option<i32>,
        pub max_year: Option<i32>,
    }

    impl GameFilter {
        pub fn genre_list(&self) -> Vec<String> {
            split_list(self.genres.as_deref())
        }

        pub fn platform_list(&self) -> Vec<String> {
            split_list(self.platforms.as_deref())
        }

        /// Blank text criteria behave as if they were not given.
        pub fn search_term(&self) -> Option<&str> {
            non_blank(self.q.as_deref())
        }

        pub fn developer_term(&self) -> Option<&str> {
            non_blank(self.developer.as_deref())
        }

        pub fn publisher_term(&self) -> Option<&str> {
            non_blank(self.publisher.as_deref())
        }
    }

    fn split_list(raw: Option<&str>) -> Vec<String> {
        raw.map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
    }

    fn non_blank(raw: Option<&str>) -> Option<&str> {
        raw.map(str::trim).filter(|s| !s.is_empty())
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Review {
        pub id: i64,
        pub game_id: i64,
        pub rating: i32,
        pub text: String,
        pub ip_address: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReviewGame {
        pub id: i64,
        pub title: String,
    }

    /// A review with its game embedded.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReviewDetail {
        pub id: i64,
        pub rating: i32,
        pub text: String,
        pub ip_address: String,
        pub created_at: DateTime<Utc>,
        pub game: ReviewGame,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CreateReviewRequest {
        pub game_id: i64,
        pub rating: i32,
        pub text: String,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct UpdateReviewRequest {
        pub rating: Option<i32>,
        pub text: Option<String>,
    }

    impl UpdateReviewRequest {
        pub fn is_empty(&self) -> bool {
            self.rating.is_none() && self.text.is_none()
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GameReviews {
        pub game_id: i64,
        pub game_title: String,
        pub average_rating: f64,
        pub reviews_count: i64,
        pub items: Vec<ReviewDetail>,
    }
}

pub mod pagination {
    use super::*;
    use crate::errors::ServiceError;

    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 50;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageRequest {
        pub page: u32,
        pub page_size: u32,
    }

    impl PageRequest {
        pub fn new(
            page: Option<u32>,
            page_size: Option<u32>,
            default_size: u32,
            max_size: u32,
        ) -> Result<Self, ServiceError> {
            let page = page.unwrap_or(1);
            let page_size = page_size.unwrap_or(default_size);

            if page < 1 {
                return Err(ServiceError::Validation("page must be at least 1".to_string()));
            }
            if page_size < 1 || page_size > max_size {
                return Err(ServiceError::Validation(format!(
                    "page_size must be between 1 and {}",
                    max_size
                )));
            }

            Ok(Self { page, page_size })
        }

        pub fn offset(&self) -> i64 {
            (self.page as i64 - 1) * self.page_size as i64
        }

        pub fn limit(&self) -> i64 {
            self.page_size as i64
        }
    }

    pub fn page_count(total: i64, page_size: u32) -> i64 {
        if total <= 0 || page_size == 0 {
            return 0;
        }
        let size = page_size as i64;
        (total + size - 1) / size
    }

    /// Limit for the `top` and `recent` listings.
    pub fn list_limit(limit: Option<u32>) -> Result<i64, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 || limit > MAX_LIMIT {
            return Err(ServiceError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Ok(limit as i64)
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Page<T> {
        pub items: Vec<T>,
        pub total: i64,
        pub page: u32,
        pub page_size: u32,
        pub pages: i64,
    }

    impl<T> Page<T> {
        pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
            Self {
                items,
                total,
                page: request.page,
                page_size: request.page_size,
                pages: page_count(total, request.page_size),
            }
        }
    }
}

pub mod validation {
    use crate::models::{CreateGameRequest, CreateReviewRequest, GameFilter, UpdateGameRequest, UpdateReviewRequest};

    pub const MIN_YEAR: i32 = 1900;
    pub const MAX_YEAR: i32 = 2030;

    pub fn validate_title(title: &str) -> Result<(), String> {
        if !(1..=255).contains(&title.chars().count()) {
            return Err("Title must be between 1 and 255 characters".to_string());
        }
        Ok(())
    }

    fn required<'a, T>(field: &str, value: &'a Option<Option<T>>) -> Result<Option<&'a T>, String> {
        match value {
            Some(None) => Err(format!("{} cannot be null", field)),
            Some(Some(v)) => Ok(Some(v)),
            None => Ok(None),
        }
    }

    fn nullable<'a>(value: &'a Option<Option<String>>) -> Option<&'a str> {
        value.as_ref().and_then(|v| v.as_deref())
    }

    pub fn validate_max_len(field: &str, value: Option<&str>, max: usize) -> Result<(), String> {
        match value {
            Some(v) if v.chars().count() > max => {
                Err(format!("{} must be at most {} characters", field, max))
            }
            _ => Ok(()),
        }
    }

    pub fn validate_release_year(year: i32) -> Result<(), String> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(format!("release_year must be between {} and {}", MIN_YEAR, MAX_YEAR));
        }
        Ok(())
    }

    pub fn validate_rating(rating: i32) -> Result<(), String> {
        if !(1..=10).contains(&rating) {
            return Err("rating must be between 1 and 10".to_string());
        }
        Ok(())
    }

    pub fn validate_review_text(text: &str) -> Result<(), String> {
        if text.chars().count() < 10 {
            return Err("Review text must be at least 10 characters".to_string());
        }
        Ok(())
    }

    pub fn validate_create_game_request(req: &CreateGameRequest) -> Result<(), String> {
        validate_title(&req.title)?;
        validate_max_len("developer", req.developer.as_deref(), 255)?;
        validate_max_len("publisher", req.publisher.as_deref(), 255)?;
        validate_release_year(req.release_year)?;
        validate_max_len("cover_image_path", req.cover_image_path.as_deref(), 512)?;
        Ok(())
    }

    /// `title`, `release_year`, `genres` and `platforms` may be omitted but never set to `null`.
    pub fn validate_update_game_request(req: &UpdateGameRequest) -> Result<(), String> {
        if let Some(title) = required("title", &req.title)? {
            validate_title(title)?;
        }
        if let Some(year) = required("release_year", &req.release_year)? {
            validate_release_year(*year)?;
        }
        required("genres", &req.genres)?;
        required("platforms", &req.platforms)?;
        validate_max_len("developer", nullable(&req.developer), 255)?;
        validate_max_len("publisher", nullable(&req.publisher), 255)?;
        validate_max_len("cover_image_path", nullable(&req.cover_image_path), 512)?;
        Ok(())
    }

    pub fn validate_create_review_request(req: &CreateReviewRequest) -> Result<(), String> {
        validate_rating(req.rating)?;
        validate_review_text(&req.text)?;
        Ok(())
    }

    pub fn validate_update_review_request(req: &UpdateReviewRequest) -> Result<(), String> {
        if let Some(rating) = req.rating {
            validate_rating(rating)?;
        }
        if let Some(text) = req.text.as_deref() {
            validate_review_text(text)?;
        }
        Ok(())
    }

    pub fn validate_game_filter(filter: &GameFilter) -> Result<(), String> {
        for (name, value) in [("min_rating", filter.min_rating), ("max_rating", filter.max_rating)] {
            if let Some(v) = value {
                if !(0.0..=10.0).contains(&v) {
                    return Err(format!("{} must be between 0 and 10", name));
                }
            }
        }
        for (name, value) in [("min_year", filter.min_year), ("max_year", filter.max_year)] {
            if let Some(v) = value {
                if !(MIN_YEAR..=MAX_YEAR).contains(&v) {
                    return Err(format!("{} must be between {} and {}", name, MIN_YEAR, MAX_YEAR));
                }
            }
        }
        Ok(())
    }
}

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ServiceError {
        #[error("Not found: {0}")]
        NotFound(String),
        #[error("Conflict: {0}")]
        Conflict(String),
        #[error("Forbidden: {0}")]
        Forbidden(String),
        #[error("Validation error: {0}")]
        Validation(String),
        #[error("Bad request: {0}")]
        BadRequest(String),
        #[error("Store unavailable: {0}")]
        Unavailable(String),
    }

    impl ServiceError {
        pub fn kind(&self) -> &'static str {
            match self {
                ServiceError::NotFound(_) => "not_found",
                ServiceError::Conflict(_) => "conflict",
                ServiceError::Forbidden(_) => "forbidden",
                ServiceError::Validation(_) => "validation_error",
                ServiceError::BadRequest(_) => "bad_request",
                ServiceError::Unavailable(_) => "unavailable",
            }
        }

        pub fn message(&self) -> &str {
            match self {
                ServiceError::NotFound(msg)
                | ServiceError::Conflict(msg)
                | ServiceError::Forbidden(msg)
                | ServiceError::Validation(msg)
                | ServiceError::BadRequest(msg)
                | ServiceError::Unavailable(msg) => msg,
            }
        }
    }
}

pub use models::*;
pub use pagination::*;
pub use errors::*;
