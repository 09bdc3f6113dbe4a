//! Integration tests for the catalog API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, backed by the in-memory catalog store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use reel_catalog::{ImportSettings, MemoryStore};
use reel_server::{AppState, build_router};
use reel_types::{ChangeEvent, ChangeKind};
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_state() -> Arc<AppState<MemoryStore>> {
    Arc::new(AppState::new(
        MemoryStore::new(),
        ImportSettings::default(),
        "user",
    ))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn xml_request(uri: &str, xml: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/xml")
        .body(Body::from(xml.to_owned()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn person_json(name: &str) -> Value {
    json!({
        "name": name,
        "hairColor": "BLACK",
        "location": { "x": 1, "y": 2.5, "z": 3.0 }
    })
}

fn record_json(name: &str, operator_id: i64, genre: &str, rating: &str) -> Value {
    json!({
        "name": name,
        "coordinates": { "x": 1, "y": 2 },
        "oscarsCount": 2,
        "budget": 10.5,
        "goldenPalmCount": 1,
        "mpaaRating": rating,
        "genre": genre,
        "operator": { "id": operator_id }
    })
}

const MOVIES_XML: &str = "<movies>\
    <movie>\
      <name>Heat</name>\
      <coordinates><x>1</x><y>2</y></coordinates>\
      <oscarsCount>1</oscarsCount><budget>60.5</budget>\
      <goldenPalmCount>1</goldenPalmCount>\
      <mpaaRating>PG_13</mpaaRating><genre>THRILLER</genre>\
      <operator><name>Spinotti</name><hairColor>RED</hairColor>\
        <location><x>0</x><y>0</y><z>0</z></location></operator>\
    </movie>\
  </movies>";

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn health_answers_pong() {
    let router = build_router(make_state());
    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn person_crud_round_trip() {
    let router = build_router(make_state());

    let (status, created) =
        send(&router, json_request("POST", "/api/persons", &person_json("Mann"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = send(&router, get(&format!("/api/persons/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Mann");
    assert_eq!(fetched["hairColor"], "BLACK");

    let (status, _) = send(
        &router,
        Request::delete(format!("/api/persons/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&router, get(&format!("/api/persons/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn invalid_person_is_a_bad_request() {
    let router = build_router(make_state());
    let (status, body) = send(
        &router,
        json_request("POST", "/api/persons", &json!({ "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name must not be blank");
}

#[tokio::test]
async fn malformed_json_uses_the_error_body() {
    let router = build_router(make_state());
    let request = Request::post("/api/persons")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn record_listing_filters_sorts_and_pages() {
    let router = build_router(make_state());
    let (_, operator) =
        send(&router, json_request("POST", "/api/persons", &person_json("Op"))).await;
    let op = operator["id"].as_i64().unwrap();

    for (name, genre, rating) in [
        ("Alpha", "ACTION", "G"),
        ("Bravo", "HORROR", "PG"),
        ("Charlie", "ACTION", "PG"),
    ] {
        let (status, _) = send(
            &router,
            json_request("POST", "/api/movies", &record_json(name, op, genre, rating)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, listed) = send(
        &router,
        get("/api/movies?genre=act&sortBy=name&sortOrder=desc"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Charlie", "Alpha"]);

    let (_, page) = send(&router, get("/api/movies?page=1&size=2&sortBy=name&sortOrder=asc")).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["name"], "Charlie");

    let (_, grouped) = send(&router, get("/api/movies/group-by-mpaa")).await;
    assert_eq!(grouped["PG"], 2);
    assert_eq!(grouped["G"], 1);
    assert!(grouped.get("NC_17").is_none());

    let (_, above) = send(&router, get("/api/movies/count-genre-gt?threshold=ACTION")).await;
    assert_eq!(above, 1);

    let (_, below) = send(&router, get("/api/movies/genre-lt?threshold=HORROR")).await;
    assert_eq!(below.as_array().unwrap().len(), 2);

    let (status, _) = send(&router, get("/api/movies/genre-lt?threshold=MUSICAL")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn referenced_person_cannot_be_deleted() {
    let router = build_router(make_state());
    let (_, operator) =
        send(&router, json_request("POST", "/api/persons", &person_json("Op"))).await;
    let op = operator["id"].as_i64().unwrap();
    send(
        &router,
        json_request("POST", "/api/movies", &record_json("Heat", op, "THRILLER", "G")),
    )
    .await;

    let (status, body) = send(
        &router,
        Request::delete(format!("/api/persons/{op}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("still referenced"));
}

#[tokio::test]
async fn import_creates_records_and_history() {
    let state = make_state();
    let mut events = state.subscribe();
    let router = build_router(Arc::clone(&state));

    let (status, attempt) = send(
        &router,
        xml_request("/api/import/movies?username=alice", MOVIES_XML),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attempt["status"], "SUCCESS");
    assert_eq!(attempt["objectsCount"], 1);
    assert_eq!(attempt["fileName"], "movies_import.xml");
    assert_eq!(attempt["username"], "alice");

    let event: ChangeEvent = events.recv().await.unwrap();
    assert_eq!(event.kind, ChangeKind::RecordCreated);

    let (_, listed) = send(&router, get("/api/movies")).await;
    assert_eq!(listed[0]["name"], "Heat");

    let id = attempt["id"].as_i64().unwrap();
    let (status, entry) = send(&router, get(&format!("/api/import/history/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["status"], "SUCCESS");
}

#[tokio::test]
async fn failed_import_reports_and_audits() {
    let router = build_router(make_state());
    let doubled = MOVIES_XML.replace("</movies>", "")
        + &MOVIES_XML.replace("<movies>", "");

    let (status, body) = send(
        &router,
        xml_request("/api/import/movies?username=bob&filename=dup.xml", &doubled),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Import failed: "));

    let (_, listed) = send(&router, get("/api/movies")).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (_, history) = send(&router, get("/api/import/history?username=bob")).await;
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "FAILED");
    assert_eq!(rows[0]["fileName"], "dup.xml");
    assert_eq!(rows[0]["objectsCount"], 0);
}

#[tokio::test]
async fn history_is_scoped_unless_admin() {
    let router = build_router(make_state());
    send(&router, xml_request("/api/import/persons?username=alice", "<persons/>")).await;
    send(&router, xml_request("/api/import/persons?username=bob", "<persons/>")).await;

    let (_, alice) = send(&router, get("/api/import/history?username=alice")).await;
    assert_eq!(alice.as_array().unwrap().len(), 1);
    assert_eq!(alice[0]["fileName"], "persons_import.xml");

    let (_, all) = send(&router, get("/api/import/history?username=alice&admin=true")).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_history_entry_is_not_found() {
    let router = build_router(make_state());
    let response = router.oneshot(get("/api/import/history/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}
