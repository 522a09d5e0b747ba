//! Drink CRUD integration tests.
//!
//! Exercises the HTTP API end to end against the in-memory store.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use drinks_service::models::{Ingredient, NewDrink};
use drinks_service::repositories::mock::InMemoryDrinkRepository;
use drinks_test_utils::{MockIssuer, TestDrinksServer};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const ALL_PERMISSIONS: &[&str] = &[
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];

fn ingredient(name: &str, color: &str, parts: i64) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        color: color.to_string(),
        parts,
    }
}

/// Server pre-seeded with "Water" (id 1) and "Latte" (id 2).
async fn seeded_server() -> Result<TestDrinksServer> {
    let repository = InMemoryDrinkRepository::with_drinks(vec![
        NewDrink {
            title: "Water".to_string(),
            recipe: vec![ingredient("water", "blue", 1)],
        },
        NewDrink {
            title: "Latte".to_string(),
            recipe: vec![
                ingredient("espresso", "brown", 1),
                ingredient("milk", "white", 3),
            ],
        },
    ])
    .await?;

    TestDrinksServer::spawn_with(MockIssuer::start().await, repository).await
}

fn admin_token(server: &TestDrinksServer) -> String {
    server.token().with_permissions(ALL_PERMISSIONS).sign()
}

async fn body_of(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_public_list_without_token() -> Result<()> {
    let server = seeded_server().await?;

    let response = reqwest::get(format!("{}/drinks", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["drinks"],
        json!([
            {"id": 1, "title": "Water", "recipe": [{"color": "blue", "parts": 1}]},
            {"id": 2, "title": "Latte", "recipe": [
                {"color": "brown", "parts": 1},
                {"color": "white", "parts": 3}
            ]}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_short_projection_never_exposes_names() -> Result<()> {
    let server = seeded_server().await?;

    let body = body_of(reqwest::get(format!("{}/drinks", server.url())).await?).await;

    for drink in body["drinks"].as_array().unwrap() {
        for item in drink["recipe"].as_array().unwrap() {
            assert!(item.get("name").is_none(), "short projection leaked {item}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_detail_list_uses_long_projection() -> Result<()> {
    let server = seeded_server().await?;
    let token = server
        .token()
        .with_permissions(&["get:drinks-detail"])
        .sign();

    let response = Client::new()
        .get(format!("{}/drinks-detail", server.url()))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(
        body["drinks"][1],
        json!({"id": 2, "title": "Latte", "recipe": [
            {"name": "espresso", "color": "brown", "parts": 1},
            {"name": "milk", "color": "white", "parts": 3}
        ]})
    );
    Ok(())
}

#[tokio::test]
async fn test_detail_list_without_token_is_unauthorized() -> Result<()> {
    let server = seeded_server().await?;

    let response = reqwest::get(format!("{}/drinks-detail", server.url())).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_water_with_single_ingredient_object() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;
    let token = server.token().with_permissions(&["post:drinks"]).sign();

    let response = Client::new()
        .post(format!("{}/drinks", server.url()))
        .bearer_auth(token)
        .json(&json!({"title": "Water", "recipe": {"name": "water", "color": "blue", "parts": 1}}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["success"], true);
    let drinks = body["drinks"].as_array().unwrap();
    assert_eq!(drinks.len(), 1);
    assert!(drinks[0]["id"].as_i64().is_some());
    assert_eq!(drinks[0]["title"], "Water");
    assert_eq!(
        drinks[0]["recipe"],
        json!([{"name": "water", "color": "blue", "parts": 1}])
    );
    Ok(())
}

#[tokio::test]
async fn test_create_with_ingredient_list_keeps_order() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;

    let response = Client::new()
        .post(format!("{}/drinks", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({"title": "Flat White", "recipe": [
            {"name": "milk", "color": "white", "parts": 2},
            {"name": "espresso", "color": "brown", "parts": 2}
        ]}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let stored = server.repository().snapshot().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].recipe,
        vec![
            ingredient("milk", "white", 2),
            ingredient("espresso", "brown", 2)
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_create_missing_fields_is_bad_request() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;
    let token = admin_token(&server);

    for body in [
        json!({"recipe": []}),
        json!({"title": "Tea"}),
        json!({}),
        json!({"title": "   ", "recipe": []}),
    ] {
        let response = Client::new()
            .post(format!("{}/drinks", server.url()))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let error = body_of(response).await;
        assert_eq!(error["success"], false);
        assert_eq!(error["error"], 400);
    }
    assert!(server.repository().snapshot().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_malformed_json_is_bad_request() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;

    let response = Client::new()
        .post(format!("{}/drinks", server.url()))
        .bearer_auth(admin_token(&server))
        .header("content-type", "application/json")
        .body("{\"title\": ")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_of(response).await["error"], 400);
    Ok(())
}

#[tokio::test]
async fn test_create_duplicate_title_is_unprocessable() -> Result<()> {
    let server = seeded_server().await?;
    let before = server.repository().snapshot().await;

    let response = Client::new()
        .post(format!("{}/drinks", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({"title": "Water", "recipe": [{"name": "ice", "color": "clear", "parts": 1}]}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_of(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 422);
    assert_eq!(server.repository().snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn test_create_during_outage_is_server_error() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;
    server.repository().set_unavailable(true);

    let response = Client::new()
        .post(format!("{}/drinks", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({"title": "Tea", "recipe": []}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_of(response).await["message"], "internal server error");
    Ok(())
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_patch_title_only_keeps_recipe() -> Result<()> {
    let server = seeded_server().await?;

    let response = Client::new()
        .patch(format!("{}/drinks/2", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({"title": "Cafe Latte"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(
        body["drinks"],
        json!([{"id": 2, "title": "Cafe Latte", "recipe": [
            {"name": "espresso", "color": "brown", "parts": 1},
            {"name": "milk", "color": "white", "parts": 3}
        ]}])
    );
    Ok(())
}

#[tokio::test]
async fn test_patch_recipe_only_keeps_title() -> Result<()> {
    let server = seeded_server().await?;

    let response = Client::new()
        .patch(format!("{}/drinks/1", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({"recipe": {"name": "sparkling water", "color": "clear", "parts": 2}}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["drinks"][0]["title"], "Water");
    assert_eq!(
        body["drinks"][0]["recipe"],
        json!([{"name": "sparkling water", "color": "clear", "parts": 2}])
    );
    Ok(())
}

#[tokio::test]
async fn test_patch_empty_body_returns_drink_unchanged() -> Result<()> {
    let server = seeded_server().await?;
    let before = server.repository().snapshot().await;

    let response = Client::new()
        .patch(format!("{}/drinks/1", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await["drinks"][0]["title"], "Water");
    assert_eq!(server.repository().snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn test_patch_unknown_id_is_not_found() -> Result<()> {
    let server = seeded_server().await?;
    let before = server.repository().snapshot().await;

    for id in ["99", "not-a-number"] {
        let response = Client::new()
            .patch(format!("{}/drinks/{id}", server.url()))
            .bearer_auth(admin_token(&server))
            .json(&json!({"title": "Ghost"}))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "id {id}");
        let body = body_of(response).await;
        assert_eq!(body["error"], 404);
        assert_eq!(body["message"], "resource not found");
    }
    assert_eq!(server.repository().snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn test_patch_to_existing_title_is_unprocessable() -> Result<()> {
    let server = seeded_server().await?;

    let response = Client::new()
        .patch(format!("{}/drinks/2", server.url()))
        .bearer_auth(admin_token(&server))
        .json(&json!({"title": "Water"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_drink_from_listing() -> Result<()> {
    let server = seeded_server().await?;
    let token = server.token().with_permissions(&["delete:drinks"]).sign();

    let response = Client::new()
        .delete(format!("{}/drinks/1", server.url()))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, json!({"success": true, "delete": 1}));

    let listing = body_of(reqwest::get(format!("{}/drinks", server.url())).await?).await;
    let ids: Vec<i64> = listing["drinks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2]);
    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found() -> Result<()> {
    let server = seeded_server().await?;

    let response = Client::new()
        .delete(format!("{}/drinks/42", server.url()))
        .bearer_auth(admin_token(&server))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.repository().snapshot().await.len(), 2);
    Ok(())
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_update_delete_lifecycle() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;
    let client = Client::new();
    let token = admin_token(&server);

    let created = body_of(
        client
            .post(format!("{}/drinks", server.url()))
            .bearer_auth(&token)
            .json(&json!({"title": "Mocha", "recipe": [{"name": "chocolate", "color": "brown", "parts": 1}]}))
            .send()
            .await?,
    )
    .await;
    let id = created["drinks"][0]["id"].as_i64().unwrap();

    let updated = client
        .patch(format!("{}/drinks/{id}", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "Dark Mocha"}))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);

    let detail = body_of(
        client
            .get(format!("{}/drinks-detail", server.url()))
            .bearer_auth(&token)
            .send()
            .await?,
    )
    .await;
    assert_eq!(detail["drinks"][0]["title"], "Dark Mocha");
    assert_eq!(detail["drinks"][0]["recipe"][0]["name"], "chocolate");

    let deleted = client
        .delete(format!("{}/drinks/{id}", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(body_of(deleted).await["delete"], id);

    let listing = body_of(reqwest::get(format!("{}/drinks", server.url())).await?).await;
    assert_eq!(listing["drinks"], json!([]));
    Ok(())
}
