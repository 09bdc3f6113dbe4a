//! Axum router construction for the catalog API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use reel_catalog::CatalogStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, imports, ws};

/// Build the complete router: REST endpoints under `/api`, the change
/// stream at `/ws/events` and the `/health` probe. CORS allows any origin.
pub fn build_router<S: CatalogStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws/events", get(ws::ws_events::<S>))
        // Records
        .route(
            "/api/movies",
            get(handlers::list_records::<S>).post(handlers::create_record::<S>),
        )
        .route("/api/movies/group-by-mpaa", get(handlers::group_by_rating::<S>))
        .route("/api/movies/count-genre-gt", get(handlers::count_genre_above::<S>))
        .route("/api/movies/genre-lt", get(handlers::genre_below::<S>))
        .route(
            "/api/movies/{id}",
            get(handlers::get_record::<S>)
                .put(handlers::update_record::<S>)
                .delete(handlers::delete_record::<S>),
        )
        // Persons
        .route(
            "/api/persons",
            get(handlers::list_persons::<S>).post(handlers::create_person::<S>),
        )
        .route(
            "/api/persons/{id}",
            get(handlers::get_person::<S>)
                .put(handlers::update_person::<S>)
                .delete(handlers::delete_person::<S>),
        )
        // Imports
        .route("/api/import/movies", post(imports::import_records::<S>))
        .route("/api/import/persons", post(imports::import_persons::<S>))
        .route("/api/import/history", get(imports::history::<S>))
        .route("/api/import/history/{id}", get(imports::history_entry::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
