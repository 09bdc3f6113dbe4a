//! REST endpoint handlers for records, persons and analytics.
//!
//! All handlers are generic over the [`CatalogStore`] so the same router
//! serves `PostgreSQL` in production and the in-memory store in tests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/movies` | Filtered, sorted, paginated record list |
//! | `POST` | `/api/movies` | Create a record |
//! | `GET` | `/api/movies/{id}` | Single record |
//! | `PUT` | `/api/movies/{id}` | Replace a record |
//! | `DELETE` | `/api/movies/{id}` | Delete a record |
//! | `GET` | `/api/movies/group-by-mpaa` | Record count per rating |
//! | `GET` | `/api/movies/count-genre-gt` | Count of records above a genre |
//! | `GET` | `/api/movies/genre-lt` | Records below a genre |
//! | `GET` | `/api/persons` | All persons |
//! | `POST` | `/api/persons` | Create a person |
//! | `GET` | `/api/persons/{id}` | Single person |
//! | `PUT` | `/api/persons/{id}` | Replace or create a person |
//! | `DELETE` | `/api/persons/{id}` | Delete an unreferenced person |

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use reel_catalog::{CatalogStore, ListParams};
use reel_types::{Genre, MpaaRating, Person, PersonDraft, PersonId, Record, RecordDraft, RecordId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{JsonBody, Params, PathId};
use crate::state::AppState;

type Shared<S> = State<Arc<AppState<S>>>;

/// Query parameters for the genre comparison endpoints.
#[derive(Debug, Deserialize)]
pub struct GenreThreshold {
    /// Genre to compare against.
    pub threshold: Genre,
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "pong"
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// `GET /api/movies`
pub async fn list_records<S: CatalogStore>(
    State(state): Shared<S>,
    Params(params): Params<ListParams>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.catalog.list_records(&params).await?))
}

/// `POST /api/movies`
pub async fn create_record<S: CatalogStore>(
    State(state): Shared<S>,
    JsonBody(draft): JsonBody<RecordDraft>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let record = state.catalog.create_record(&draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/movies/{id}`
pub async fn get_record<S: CatalogStore>(
    State(state): Shared<S>,
    PathId(id): PathId<RecordId>,
) -> Result<Json<Record>, ApiError> {
    Ok(Json(state.catalog.get_record(id).await?))
}

/// `PUT /api/movies/{id}`
pub async fn update_record<S: CatalogStore>(
    State(state): Shared<S>,
    PathId(id): PathId<RecordId>,
    JsonBody(draft): JsonBody<RecordDraft>,
) -> Result<Json<Record>, ApiError> {
    Ok(Json(state.catalog.update_record(id, &draft).await?))
}

/// `DELETE /api/movies/{id}`
pub async fn delete_record<S: CatalogStore>(
    State(state): Shared<S>,
    PathId(id): PathId<RecordId>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_record(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// `GET /api/movies/group-by-mpaa`
pub async fn group_by_rating<S: CatalogStore>(
    State(state): Shared<S>,
) -> Result<Json<BTreeMap<MpaaRating, i64>>, ApiError> {
    Ok(Json(state.catalog.count_records_by_rating().await?))
}

/// `GET /api/movies/count-genre-gt?threshold=`
pub async fn count_genre_above<S: CatalogStore>(
    State(state): Shared<S>,
    Params(query): Params<GenreThreshold>,
) -> Result<Json<i64>, ApiError> {
    Ok(Json(
        state.catalog.count_records_genre_above(query.threshold).await?,
    ))
}

/// `GET /api/movies/genre-lt?threshold=`
pub async fn genre_below<S: CatalogStore>(
    State(state): Shared<S>,
    Params(query): Params<GenreThreshold>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.catalog.records_genre_below(query.threshold).await?))
}

// ---------------------------------------------------------------------------
// Persons
// ---------------------------------------------------------------------------

/// `GET /api/persons`
pub async fn list_persons<S: CatalogStore>(
    State(state): Shared<S>,
) -> Result<Json<Vec<Person>>, ApiError> {
    Ok(Json(state.catalog.list_persons().await?))
}

/// `POST /api/persons`
pub async fn create_person<S: CatalogStore>(
    State(state): Shared<S>,
    JsonBody(draft): JsonBody<PersonDraft>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let person = state.catalog.create_person(&draft).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /api/persons/{id}`
pub async fn get_person<S: CatalogStore>(
    State(state): Shared<S>,
    PathId(id): PathId<PersonId>,
) -> Result<Json<Person>, ApiError> {
    Ok(Json(state.catalog.get_person(id).await?))
}

/// `PUT /api/persons/{id}`
pub async fn update_person<S: CatalogStore>(
    State(state): Shared<S>,
    PathId(id): PathId<PersonId>,
    JsonBody(draft): JsonBody<PersonDraft>,
) -> Result<Json<Person>, ApiError> {
    Ok(Json(state.catalog.update_person(id, &draft).await?))
}

/// `DELETE /api/persons/{id}`
pub async fn delete_person<S: CatalogStore>(
    State(state): Shared<S>,
    PathId(id): PathId<PersonId>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_person(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
