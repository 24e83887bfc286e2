use async_trait::async_trait;
use common::{CreateGameRequest, GameFilter, PageRequest, UpdateGameRequest, UpdateReviewRequest};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::models::{rating_from_f64, DbGame, DbReview, DbReviewWithGame, GameOrder, NewReview, ReviewStats};
use crate::store::{CatalogStore, StoreError};

const REVIEW_WITH_GAME: &str = r#"
     SELECT r.id, r.game_id, r.rating, r.text, r.ip_address, r.created_at, g.title AS game_title
     FROM reviews r
     JOIN games g ON g.id = r.game_id
"#;

pub struct PgStore {
     pool: PgPool,
}

impl PgStore {
     pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
          let pool = PgPoolOptions::new()
               .max_connections(max_connections)
               .connect(database_url)
               .await?;

          Ok(Self { pool })
     }

     pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
          sqlx::migrate!("./migrations").run(&self.pool).await
     }
}

fn like_pattern(term: &str) -> String {
     let escaped = term
          .replace('\\', "\\\\")
          .replace('%', "\\%")
          .replace('_', "\\_");
     format!("%{}%", escaped)
}

fn push_game_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &GameFilter) {
     query.push(" WHERE TRUE");

     if let Some(q) = filter.search_term() {
          query.push(" AND title ILIKE ").push_bind(like_pattern(q));
     }
     for genre in filter.genre_list() {
          query
               .push(" AND EXISTS (SELECT 1 FROM unnest(genres) AS g WHERE lower(g) = lower(")
               .push_bind(genre)
               .push("))");
     }
     for platform in filter.platform_list() {
          query
               .push(" AND EXISTS (SELECT 1 FROM unnest(platforms) AS p WHERE lower(p) = lower(")
               .push_bind(platform)
               .push("))");
     }
     if let Some(developer) = filter.developer_term() {
          query.push(" AND developer ILIKE ").push_bind(like_pattern(developer));
     }
     if let Some(publisher) = filter.publisher_term() {
          query.push(" AND publisher ILIKE ").push_bind(like_pattern(publisher));
     }
     if let Some(min) = filter.min_rating {
          query.push(" AND average_rating >= ").push_bind(rating_from_f64(min));
     }
     if let Some(max) = filter.max_rating {
          query.push(" AND average_rating <= ").push_bind(rating_from_f64(max));
     }
     if let Some(min) = filter.min_year {
          query.push(" AND release_year >= ").push_bind(min);
     }
     if let Some(max) = filter.max_year {
          query.push(" AND release_year <= ").push_bind(max);
     }
}

/// Emits one assignment per provided field; an explicit `null` binds SQL NULL.
fn push_game_changes(query: &mut QueryBuilder<'_, Postgres>, changes: &UpdateGameRequest) {
     let mut set = query.separated(", ");

     if let Some(title) = &changes.title {
          set.push("title = ").push_bind_unseparated(title.clone());
     }
     if let Some(description) = &changes.description {
          set.push("description = ").push_bind_unseparated(description.clone());
     }
     if let Some(genres) = &changes.genres {
          set.push("genres = ").push_bind_unseparated(genres.clone());
     }
     if let Some(developer) = &changes.developer {
          set.push("developer = ").push_bind_unseparated(developer.clone());
     }
     if let Some(publisher) = &changes.publisher {
          set.push("publisher = ").push_bind_unseparated(publisher.clone());
     }
     if let Some(year) = changes.release_year {
          set.push("release_year = ").push_bind_unseparated(year);
     }
     if let Some(platforms) = &changes.platforms {
          set.push("platforms = ").push_bind_unseparated(platforms.clone());
     }
     if let Some(path) = &changes.cover_image_path {
          set.push("cover_image_path = ").push_bind_unseparated(path.clone());
     }
}

#[async_trait]
impl CatalogStore for PgStore {
     async fn ping(&self) -> Result<(), StoreError> {
          sqlx::query("SELECT 1 FROM games LIMIT 1")
               .execute(&self.pool)
               .await?;
          Ok(())
     }

     async fn list_games(&self, filter: &GameFilter, page: PageRequest) -> Result<(Vec<DbGame>, i64), StoreError> {
          let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM games");
          push_game_filter(&mut count_query, filter);
          let total: i64 = count_query
               .build_query_scalar::<i64>()
               .fetch_one(&self.pool)
               .await?;

          let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM games");
          push_game_filter(&mut query, filter);
          query
               .push(" ORDER BY id ASC LIMIT ")
               .push_bind(page.limit())
               .push(" OFFSET ")
               .push_bind(page.offset());

          let games = query
               .build_query_as::<DbGame>()
               .fetch_all(&self.pool)
               .await?;

          Ok((games, total))
     }

     async fn get_game(&self, id: i64) -> Result<Option<DbGame>, StoreError> {
          let record = sqlx::query_as::<_, DbGame>("SELECT * FROM games WHERE id = $1")
               .bind(id)
               .fetch_optional(&self.pool)
               .await?;

          Ok(record)
     }

     async fn insert_game(&self, game: &CreateGameRequest) -> Result<DbGame, StoreError> {
          let record = sqlx::query_as::<_, DbGame>(
               r#"
               INSERT INTO games (title, description, genres, developer, publisher, release_year, platforms, cover_image_path)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *
               "#,
          )
          .bind(&game.title)
          .bind(&game.description)
          .bind(game.genres.clone())
          .bind(&game.developer)
          .bind(&game.publisher)
          .bind(game.release_year)
          .bind(game.platforms.clone())
          .bind(&game.cover_image_path)
          .fetch_one(&self.pool)
          .await?;

          Ok(record)
     }

     async fn update_game(&self, id: i64, changes: &UpdateGameRequest) -> Result<Option<DbGame>, StoreError> {
          if changes.is_empty() {
               return self.get_game(id).await;
          }

          let mut query = QueryBuilder::<Postgres>::new("UPDATE games SET ");
          push_game_changes(&mut query, changes);
          query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

          let record = query
               .build_query_as::<DbGame>()
               .fetch_optional(&self.pool)
               .await?;

          Ok(record)
     }

     async fn delete_game(&self, id: i64) -> Result<bool, StoreError> {
          let result = sqlx::query("DELETE FROM games WHERE id = $1")
               .bind(id)
               .execute(&self.pool)
               .await?;

          Ok(result.rows_affected() > 0)
     }

     async fn ordered_games(&self, order: GameOrder, limit: i64) -> Result<Vec<DbGame>, StoreError> {
          let sql = match order {
               GameOrder::TopRated => "SELECT * FROM games ORDER BY average_rating DESC, id ASC LIMIT $1",
               GameOrder::Recent => "SELECT * FROM games ORDER BY created_at DESC, id DESC LIMIT $1",
          };

          let records = sqlx::query_as::<_, DbGame>(sql)
               .bind(limit)
               .fetch_all(&self.pool)
               .await?;

          Ok(records)
     }

     async fn distinct_genres(&self) -> Result<Vec<String>, StoreError> {
          let genres = sqlx::query_scalar::<_, String>(
               "SELECT DISTINCT unnest(genres) AS genre FROM games ORDER BY genre",
          )
          .fetch_all(&self.pool)
          .await?;

          Ok(genres)
     }

     async fn distinct_platforms(&self) -> Result<Vec<String>, StoreError> {
          let platforms = sqlx::query_scalar::<_, String>(
               "SELECT DISTINCT unnest(platforms) AS platform FROM games ORDER BY platform",
          )
          .fetch_all(&self.pool)
          .await?;

          Ok(platforms)
     }

     async fn set_average_rating(&self, game_id: i64, rating: Decimal) -> Result<(), StoreError> {
          sqlx::query("UPDATE games SET average_rating = $2 WHERE id = $1")
               .bind(game_id)
               .bind(rating)
               .execute(&self.pool)
               .await?;

          Ok(())
     }

     async fn list_reviews(&self, page: PageRequest) -> Result<(Vec<DbReview>, i64), StoreError> {
          let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
               .fetch_one(&self.pool)
               .await?;

          let records = sqlx::query_as::<_, DbReview>(
               "SELECT * FROM reviews ORDER BY id ASC LIMIT $1 OFFSET $2",
          )
          .bind(page.limit())
          .bind(page.offset())
          .fetch_all(&self.pool)
          .await?;

          Ok((records, total))
     }

     async fn recent_reviews(&self, limit: i64) -> Result<Vec<DbReviewWithGame>, StoreError> {
          let sql = format!("{} ORDER BY r.created_at DESC, r.id DESC LIMIT $1", REVIEW_WITH_GAME);
          let records = sqlx::query_as::<_, DbReviewWithGame>(&sql)
               .bind(limit)
               .fetch_all(&self.pool)
               .await?;

          Ok(records)
     }

     async fn get_review(&self, id: i64) -> Result<Option<DbReview>, StoreError> {
          let record = sqlx::query_as::<_, DbReview>("SELECT * FROM reviews WHERE id = $1")
               .bind(id)
               .fetch_optional(&self.pool)
               .await?;

          Ok(record)
     }

     async fn get_review_with_game(&self, id: i64) -> Result<Option<DbReviewWithGame>, StoreError> {
          let sql = format!("{} WHERE r.id = $1", REVIEW_WITH_GAME);
          let record = sqlx::query_as::<_, DbReviewWithGame>(&sql)
               .bind(id)
               .fetch_optional(&self.pool)
               .await?;

          Ok(record)
     }

     async fn find_review_by_author(&self, game_id: i64, ip_address: &str) -> Result<Option<DbReview>, StoreError> {
          let record = sqlx::query_as::<_, DbReview>(
               "SELECT * FROM reviews WHERE game_id = $1 AND ip_address = $2",
          )
          .bind(game_id)
          .bind(ip_address)
          .fetch_optional(&self.pool)
          .await?;

          Ok(record)
     }

     async fn insert_review(&self, review: &NewReview) -> Result<DbReview, StoreError> {
          let record = sqlx::query_as::<_, DbReview>(
               r#"
               INSERT INTO reviews (game_id, rating, text, ip_address)
               VALUES ($1, $2, $3, $4)
               RETURNING *
               "#,
          )
          .bind(review.game_id)
          .bind(review.rating)
          .bind(&review.text)
          .bind(&review.ip_address)
          .fetch_one(&self.pool)
          .await?;

          Ok(record)
     }

     async fn update_review(&self, id: i64, ip_address: &str, changes: &UpdateReviewRequest) -> Result<Option<DbReview>, StoreError> {
          let record = sqlx::query_as::<_, DbReview>(
               r#"
               UPDATE reviews
               SET
                    rating = COALESCE($3, rating),
                    text = COALESCE($4, text)
               WHERE id = $1 AND ip_address = $2
               RETURNING *
               "#,
          )
          .bind(id)
          .bind(ip_address)
          .bind(changes.rating)
          .bind(&changes.text)
          .fetch_optional(&self.pool)
          .await?;

          Ok(record)
     }

     async fn delete_review(&self, id: i64, ip_address: &str) -> Result<bool, StoreError> {
          let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND ip_address = $2")
               .bind(id)
               .bind(ip_address)
               .execute(&self.pool)
               .await?;

          Ok(result.rows_affected() > 0)
     }

     async fn reviews_for_game(&self, game_id: i64) -> Result<Vec<DbReviewWithGame>, StoreError> {
          let sql = format!("{} WHERE r.game_id = $1 ORDER BY r.id ASC", REVIEW_WITH_GAME);
          let records = sqlx::query_as::<_, DbReviewWithGame>(&sql)
               .bind(game_id)
               .fetch_all(&self.pool)
               .await?;

          Ok(records)
     }

     async fn count_reviews(&self, game_id: i64) -> Result<i64, StoreError> {
          let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE game_id = $1")
               .bind(game_id)
               .fetch_one(&self.pool)
               .await?;

          Ok(count)
     }

     async fn review_stats(&self, game_id: i64) -> Result<ReviewStats, StoreError> {
          let stats = sqlx::query_as::<_, ReviewStats>(
               "SELECT COUNT(*) AS count, AVG(rating) AS mean FROM reviews WHERE game_id = $1",
          )
          .bind(game_id)
          .fetch_one(&self.pool)
          .await?;

          Ok(stats)
     }
}
