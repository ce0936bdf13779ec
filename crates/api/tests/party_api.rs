//! HTTP-level integration tests for parties and their addresses.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_party_returns_201(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/parties",
        json!({"name": "Acme Training", "phone": "555-1234", "email": "office@acme.test"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Acme Training");
    assert_eq!(json["data"]["phone"], "555-1234");
    assert!(json["data"]["id"].is_number());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_party_with_invalid_email_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/parties",
        json!({"name": "Acme", "email": "not-an-email"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_missing_party_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/parties/999999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Party with id 999999 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_parties_is_paginated(pool: PgPool) {
    for name in ["A", "B", "C"] {
        common::create_party(&pool, json!({"name": name})).await;
    }

    let response = get(common::build_test_app(pool.clone()), "/api/v1/parties").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 3);

    let response = get(common::build_test_app(pool), "/api/v1/parties?limit=2&offset=2").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn addresses_are_scoped_to_their_party(pool: PgPool) {
    let acme = common::create_party(&pool, json!({"name": "Acme"})).await;
    let globex = common::create_party(&pool, json!({"name": "Globex"})).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/parties/{acme}/addresses"),
        json!({"street": "1 Main St", "city": "Springfield"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let address = body_json(response).await;
    assert_eq!(address["data"]["party_id"], acme);

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/parties/{acme}/addresses"),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/parties/{globex}/addresses"),
    )
    .await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn address_for_missing_party_returns_404(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/parties/999999/addresses",
        json!({"street": "Nowhere"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Reverse lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn party_lists_its_opportunities(pool: PgPool) {
    let acme = common::create_party(&pool, json!({"name": "Acme"})).await;
    let globex = common::create_party(&pool, json!({"name": "Globex"})).await;
    common::create_opportunity(&pool, json!({"party_id": acme})).await;
    common::create_opportunity(&pool, json!({"party_id": acme})).await;
    common::create_opportunity(&pool, json!({"party_id": globex})).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/parties/{acme}/opportunities"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["party_id"] == acme));
}
