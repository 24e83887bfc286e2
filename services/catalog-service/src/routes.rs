use std::time::Duration;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::handlers::{
    create_game, create_review, delete_game, delete_review, game_genres, game_platforms, game_reviews, get_game,
    get_review, list_games, list_reviews, recent_games, recent_reviews, service_info, top_games, update_game,
    update_review,
};
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn create_routes(state: AppState) -> Router {
    let games = Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/top", get(top_games))
        .route("/games/recent", get(recent_games))
        .route("/games/genres", get(game_genres))
        .route("/games/platforms", get(game_platforms))
        .route("/games/{id}", get(get_game).patch(update_game).delete(delete_game));

    let reviews = Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/recent", get(recent_reviews))
        .route("/reviews/game/{game_id}", get(game_reviews))
        .route("/reviews/{id}", get(get_review).patch(update_review).delete(delete_review));

    let api = games.merge(reviews);
    let router = Router::new().route("/", get(service_info));
    let router = match state.config.api_prefix.as_str() {
        "" => router.merge(api),
        prefix => router.nest(prefix, api),
    };

    router
        .layer(cors_layer(&state.config))
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!(%origin, error = %e, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}

async fn request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    debug!(%request_id, method = %req.method(), path = %req.uri().path(), "request received");

    let mut res = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    res
}
