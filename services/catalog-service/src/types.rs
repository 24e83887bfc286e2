use common::GameFilter;
use serde::{Deserialize, Serialize};

/// Query string of `GET /games`.
#[derive(Debug, Default, Deserialize)]
pub struct ListGamesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub q: Option<String>,
    pub genres: Option<String>,
    pub platforms: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl ListGamesQuery {
    pub fn filter(&self) -> GameFilter {
        GameFilter {
            q: self.q.clone(),
            genres: self.genres.clone(),
            platforms: self.platforms.clone(),
            developer: self.developer.clone(),
            publisher: self.publisher.clone(),
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            min_year: self.min_year,
            max_year: self.max_year,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
    pub docs: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
