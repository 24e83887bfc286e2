use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
};
use common::{
    list_limit, CreateGameRequest, CreateReviewRequest, Game, GameDetail, GameReviews, Page, PageRequest, Review,
    ReviewDetail, UpdateGameRequest, UpdateReviewRequest,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, ClientIp};
use crate::state::AppState;
use crate::types::{LimitQuery, ListGamesQuery, PageQuery, ServiceInfo};

fn page_request(state: &AppState, page: Option<u32>, page_size: Option<u32>) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::new(
        page,
        page_size,
        state.config.default_page_size,
        state.config.max_page_size,
    )?)
}

pub async fn service_info(State(state): State<AppState>) -> ResponseJson<ServiceInfo> {
    ResponseJson(ServiceInfo {
        service: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        status: "running".to_string(),
        docs: "/docs".to_string(),
    })
}

pub async fn list_games(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListGamesQuery>,
) -> Result<ResponseJson<Page<Game>>, ApiError> {
    let page = page_request(&state, query.page, query.page_size)?;
    let games = state.games.list(page, &query.filter()).await?;
    Ok(ResponseJson(games))
}

pub async fn get_game(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<GameDetail>, ApiError> {
    Ok(ResponseJson(state.games.get(id).await?))
}

pub async fn create_game(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateGameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let game = state.games.create(request).await?;
    Ok((StatusCode::CREATED, ResponseJson(game)))
}

pub async fn update_game(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateGameRequest>,
) -> Result<ResponseJson<Game>, ApiError> {
    Ok(ResponseJson(state.games.update(id, request).await?))
}

pub async fn delete_game(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.games.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn top_games(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<ResponseJson<Vec<Game>>, ApiError> {
    let limit = list_limit(query.limit)?;
    Ok(ResponseJson(state.games.top(limit).await?))
}

pub async fn recent_games(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<ResponseJson<Vec<Game>>, ApiError> {
    let limit = list_limit(query.limit)?;
    Ok(ResponseJson(state.games.recent(limit).await?))
}

pub async fn game_genres(State(state): State<AppState>) -> Result<ResponseJson<Vec<String>>, ApiError> {
    Ok(ResponseJson(state.games.genres().await?))
}

pub async fn game_platforms(State(state): State<AppState>) -> Result<ResponseJson<Vec<String>>, ApiError> {
    Ok(ResponseJson(state.games.platforms().await?))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<ResponseJson<Page<Review>>, ApiError> {
    let page = page_request(&state, query.page, query.page_size)?;
    Ok(ResponseJson(state.reviews.list(page).await?))
}

pub async fn recent_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<ResponseJson<Vec<ReviewDetail>>, ApiError> {
    let limit = list_limit(query.limit)?;
    Ok(ResponseJson(state.reviews.recent(limit).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ResponseJson<ReviewDetail>, ApiError> {
    Ok(ResponseJson(state.reviews.get(id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state.reviews.create(request, &ip).await?;
    Ok((StatusCode::CREATED, ResponseJson(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ClientIp(ip): ClientIp,
    ApiJson(request): ApiJson<UpdateReviewRequest>,
) -> Result<ResponseJson<Review>, ApiError> {
    Ok(ResponseJson(state.reviews.update(id, request, &ip).await?))
}

pub async fn delete_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ClientIp(ip): ClientIp,
) -> Result<StatusCode, ApiError> {
    state.reviews.delete(id, &ip).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn game_reviews(
    State(state): State<AppState>,
    ApiPath(game_id): ApiPath<i64>,
) -> Result<ResponseJson<GameReviews>, ApiError> {
    Ok(ResponseJson(state.reviews.for_game(game_id).await?))
}
