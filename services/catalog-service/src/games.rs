use std::sync::Arc;

use common::validation;
use common::{
    CreateGameRequest, Game, GameDetail, GameFilter, Page, PageRequest, ServiceError, UpdateGameRequest,
};
use tracing::{info, warn};

use crate::models::GameOrder;
use crate::store::{CatalogStore, StoreError};

#[derive(Clone)]
pub struct GamesService {
    store: Arc<dyn CatalogStore>,
}

impl GamesService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, page: PageRequest, filter: &GameFilter) -> Result<Page<Game>, ServiceError> {
        validation::validate_game_filter(filter).map_err(ServiceError::Validation)?;

        let (games, total) = self.store.list_games(filter, page).await?;
        let items = games.into_iter().map(Game::from).collect();

        Ok(Page::new(items, total, page))
    }

    pub async fn get(&self, id: i64) -> Result<GameDetail, ServiceError> {
        let game = self
            .store
            .get_game(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Game not found".to_string()))?;
        let reviews_count = self.store.count_reviews(id).await?;

        Ok(GameDetail {
            game: game.into(),
            reviews_count,
        })
    }

    pub async fn create(&self, req: CreateGameRequest) -> Result<Game, ServiceError> {
        validation::validate_create_game_request(&req).map_err(ServiceError::Validation)?;

        let record = self.store.insert_game(&req).await.map_err(|e| match e {
            StoreError::Unavailable(_) => ServiceError::from(e),
            other => ServiceError::BadRequest(format!("Failed to create game: {}", other)),
        })?;
        info!(game_id = record.id, title = %record.title, "game created");

        Ok(record.into())
    }

    pub async fn update(&self, id: i64, req: UpdateGameRequest) -> Result<Game, ServiceError> {
        if req.is_empty() {
            return Err(ServiceError::BadRequest("No fields to update".to_string()));
        }
        validation::validate_update_game_request(&req).map_err(ServiceError::Validation)?;

        let record = self
            .store
            .update_game(id, &req)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Game not found".to_string()))?;
        info!(game_id = id, "game updated");

        Ok(record.into())
    }

    /// Succeeds whether or not the game existed.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.store.delete_game(id).await? {
            info!(game_id = id, "game deleted");
        } else {
            warn!(game_id = id, "delete requested for missing game");
        }
        Ok(())
    }

    pub async fn top(&self, limit: i64) -> Result<Vec<Game>, ServiceError> {
        self.ordered(GameOrder::TopRated, limit).await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Game>, ServiceError> {
        self.ordered(GameOrder::Recent, limit).await
    }

    async fn ordered(&self, order: GameOrder, limit: i64) -> Result<Vec<Game>, ServiceError> {
        let games = self.store.ordered_games(order, limit).await?;
        Ok(games.into_iter().map(Game::from).collect())
    }

    pub async fn genres(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.distinct_genres().await?)
    }

    pub async fn platforms(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.distinct_platforms().await?)
    }
}
