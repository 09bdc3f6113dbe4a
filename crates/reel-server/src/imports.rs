//! Bulk import and import history endpoints.
//!
//! The request body is the raw XML document. A successful import answers
//! `201 Created` with the finalized audit row; a failed one answers `400`
//! with `Import failed: <cause>` after the attempt has been marked failed.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use reel_catalog::CatalogStore;
use reel_types::{ImportAttempt, ImportId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{Params, PathId};
use crate::state::AppState;

/// File name recorded for record imports that name none.
pub const DEFAULT_RECORDS_FILE: &str = "movies_import.xml";

/// File name recorded for person imports that name none.
pub const DEFAULT_PERSONS_FILE: &str = "persons_import.xml";

/// Query parameters for the import endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    /// Name of the uploaded file.
    pub filename: Option<String>,
    /// Acting user.
    pub username: Option<String>,
}

impl ImportQuery {
    fn username<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback)
    }

    fn file_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.filename
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// Query parameters for `GET /api/import/history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Restrict to one user's attempts.
    pub username: Option<String>,
    /// Return every attempt regardless of `username`.
    #[serde(default)]
    pub admin: bool,
}

/// `POST /api/import/movies`
pub async fn import_records<S: CatalogStore>(
    State(state): State<Arc<AppState<S>>>,
    Params(query): Params<ImportQuery>,
    body: String,
) -> Result<(StatusCode, Json<ImportAttempt>), ApiError> {
    let attempt = state
        .catalog
        .import_records(
            &body,
            query.username(&state.default_user),
            Some(query.file_name(DEFAULT_RECORDS_FILE)),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// `POST /api/import/persons`
pub async fn import_persons<S: CatalogStore>(
    State(state): State<Arc<AppState<S>>>,
    Params(query): Params<ImportQuery>,
    body: String,
) -> Result<(StatusCode, Json<ImportAttempt>), ApiError> {
    let attempt = state
        .catalog
        .import_persons(
            &body,
            query.username(&state.default_user),
            Some(query.file_name(DEFAULT_PERSONS_FILE)),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// `GET /api/import/history`
pub async fn history<S: CatalogStore>(
    State(state): State<Arc<AppState<S>>>,
    Params(query): Params<HistoryQuery>,
) -> Result<Json<Vec<ImportAttempt>>, ApiError> {
    let rows = state
        .catalog
        .import_history(query.username.as_deref(), query.admin)
        .await?;
    Ok(Json(rows))
}

/// `GET /api/import/history/{id}`
pub async fn history_entry<S: CatalogStore>(
    State(state): State<Arc<AppState<S>>>,
    PathId(id): PathId<ImportId>,
) -> Result<Json<ImportAttempt>, ApiError> {
    Ok(Json(state.catalog.import_attempt(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_values_fall_back() {
        let query = ImportQuery {
            filename: Some(String::from("  ")),
            username: None,
        };
        assert_eq!(query.username("user"), "user");
        assert_eq!(query.file_name(DEFAULT_RECORDS_FILE), "movies_import.xml");
    }

    #[test]
    fn supplied_query_values_win() {
        let query = ImportQuery {
            filename: Some(String::from("batch.xml")),
            username: Some(String::from("alice")),
        };
        assert_eq!(query.username("user"), "alice");
        assert_eq!(query.file_name(DEFAULT_PERSONS_FILE), "batch.xml");
    }
}
