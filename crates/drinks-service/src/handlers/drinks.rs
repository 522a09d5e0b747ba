//! Drink CRUD handlers.
//!
//! | Route | Permission |
//! |---|---|
//! | `GET /drinks` | none |
//! | `GET /drinks-detail` | `get:drinks-detail` |
//! | `POST /drinks` | `post:drinks` |
//! | `PATCH /drinks/:id` | `patch:drinks` |
//! | `DELETE /drinks/:id` | `delete:drinks` |
//!
//! Permissions are enforced by the route table (see `routes::build_routes`),
//! not here.

use crate::errors::ApiError;
use crate::models::{
    CreateDrinkRequest, DeleteResponse, Drink, DrinkPatch, DrinksResponse, NewDrink, ShortDrink,
    UpdateDrinkRequest,
};
use crate::routes::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Unwrap a JSON body, reporting any rejection as 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(target: "drinks.handlers", error = %rejection, "Rejected request body");
        ApiError::BadRequest(rejection.body_text())
    })
}

/// Unwrap a drink id. Ids that are not integers cannot match any drink.
fn drink_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(target: "drinks.handlers", error = %rejection, "Unparseable drink id");
        ApiError::NotFound("drink".to_string())
    })
}

/// Reject titles that are empty or only whitespace.
fn validate_title(title: String) -> Result<String, ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    Ok(title)
}

/// Handler for GET /drinks
///
/// Public. Returns every drink in the short projection.
#[instrument(skip_all, name = "drinks.list")]
pub async fn list_drinks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DrinksResponse<ShortDrink>>, ApiError> {
    let drinks = state.repository.list().await?;

    Ok(Json(DrinksResponse::new(
        drinks.iter().map(Drink::short).collect(),
    )))
}

/// Handler for GET /drinks-detail
///
/// Returns every drink in the long projection.
#[instrument(skip_all, name = "drinks.list_detail")]
pub async fn list_drinks_detail(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DrinksResponse<Drink>>, ApiError> {
    let drinks = state.repository.list().await?;

    Ok(Json(DrinksResponse::new(drinks)))
}

/// Handler for POST /drinks
///
/// Body: `{"title": ..., "recipe": <ingredient or list of ingredients>}`.
///
/// # Response
///
/// - 200 with the created drink in the long projection
/// - 400 if `title` or `recipe` is missing or the body is not valid JSON
/// - 422 if the title is already taken
#[instrument(skip_all, name = "drinks.create")]
pub async fn create_drink(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Drink>>, ApiError> {
    let request = json_body(payload)?;

    let (Some(title), Some(recipe)) = (request.title, request.recipe) else {
        return Err(ApiError::BadRequest(
            "title and recipe are required".to_string(),
        ));
    };

    let drink = state
        .repository
        .create(NewDrink {
            title: validate_title(title)?,
            recipe: recipe.into_ingredients(),
        })
        .await?;

    tracing::info!(target: "drinks.handlers", drink_id = drink.id, "Drink created");

    Ok(Json(DrinksResponse::new(vec![drink])))
}

/// Handler for PATCH /drinks/:id
///
/// Applies the fields present in the body; absent fields keep their value.
///
/// # Response
///
/// - 200 with the updated drink in the long projection
/// - 400 if the body is not valid JSON or the title is blank
/// - 404 if no drink has this id
/// - 422 if the new title is already taken
#[instrument(skip_all, name = "drinks.update")]
pub async fn update_drink(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Drink>>, ApiError> {
    let id = drink_id(path)?;
    let request = json_body(payload)?;

    let patch = DrinkPatch {
        title: request.title.map(validate_title).transpose()?,
        recipe: request.recipe.map(|recipe| recipe.into_ingredients()),
    };

    let drink = state.repository.update(id, patch).await?;

    tracing::info!(target: "drinks.handlers", drink_id = drink.id, "Drink updated");

    Ok(Json(DrinksResponse::new(vec![drink])))
}

/// Handler for DELETE /drinks/:id
///
/// # Response
///
/// - 200 `{"success": true, "delete": <id>}`
/// - 404 if no drink has this id
#[instrument(skip_all, name = "drinks.delete")]
pub async fn delete_drink(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = drink_id(path)?;

    let deleted = state.repository.delete(id).await?;

    tracing::info!(target: "drinks.handlers", drink_id = deleted, "Drink deleted");

    Ok(Json(DeleteResponse {
        success: true,
        delete: deleted,
    }))
}
