//! PostgreSQL drink repository.
//!
//! # Security
//!
//! - All queries use parameterized statements
//! - Uniqueness and existence are decided by single atomic statements
//!   (`ON CONFLICT`, `RETURNING`), never by a read followed by a write

use crate::errors::ApiError;
use crate::models::{Drink, DrinkPatch, Ingredient, NewDrink};
use crate::observability::metrics::record_db_query;
use crate::repositories::{DrinkRepository, DUPLICATE_TITLE_MESSAGE};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;

/// Title of the sample drink inserted by [`reset_and_seed`].
pub const SEED_DRINK_TITLE: &str = "water";

#[derive(Debug, sqlx::FromRow)]
struct DrinkRow {
    id: i32,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = ApiError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        let recipe: Vec<Ingredient> = serde_json::from_str(&row.recipe).map_err(|e| {
            tracing::error!(target: "drinks.repository", id = row.id, error = %e, "Stored recipe is not valid JSON");
            ApiError::Unprocessable("Stored recipe could not be read".to_string())
        })?;

        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe,
        })
    }
}

fn encode_recipe(recipe: &[Ingredient]) -> Result<String, ApiError> {
    serde_json::to_string(recipe).map_err(|e| {
        tracing::error!(target: "drinks.repository", error = %e, "Failed to serialize recipe");
        ApiError::Internal
    })
}

/// Record metrics for a finished query and pass the result through.
fn observe<T>(
    operation: &'static str,
    start: Instant,
    result: Result<T, sqlx::Error>,
) -> Result<T, sqlx::Error> {
    let status = if result.is_ok() { "success" } else { "error" };
    record_db_query(operation, status, start.elapsed());
    result
}

/// Drink repository backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgDrinkRepository {
    pool: PgPool,
}

impl PgDrinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrinkRepository for PgDrinkRepository {
    #[instrument(skip_all)]
    async fn list(&self) -> Result<Vec<Drink>, ApiError> {
        let start = Instant::now();
        let rows: Vec<DrinkRow> = observe(
            "list",
            start,
            sqlx::query_as("SELECT id, title, recipe FROM drinks ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await,
        )?;

        rows.into_iter().map(Drink::try_from).collect()
    }

    #[instrument(skip_all)]
    async fn create(&self, drink: NewDrink) -> Result<Drink, ApiError> {
        let recipe = encode_recipe(&drink.recipe)?;

        let start = Instant::now();
        let row: Option<DrinkRow> = observe(
            "create",
            start,
            sqlx::query_as(
                r#"
                INSERT INTO drinks (title, recipe)
                VALUES ($1, $2)
                ON CONFLICT (title) DO NOTHING
                RETURNING id, title, recipe
                "#,
            )
            .bind(&drink.title)
            .bind(&recipe)
            .fetch_optional(&self.pool)
            .await,
        )?;

        match row {
            Some(row) => {
                tracing::debug!(target: "drinks.repository", id = row.id, "Drink inserted");
                Drink::try_from(row)
            }
            None => {
                tracing::debug!(target: "drinks.repository", "Insert skipped: duplicate title");
                Err(ApiError::Unprocessable(DUPLICATE_TITLE_MESSAGE.to_string()))
            }
        }
    }

    #[instrument(skip_all, fields(id = id))]
    async fn get(&self, id: i32) -> Result<Drink, ApiError> {
        let start = Instant::now();
        let row: Option<DrinkRow> = observe(
            "get",
            start,
            sqlx::query_as("SELECT id, title, recipe FROM drinks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await,
        )?;

        row.ok_or_else(|| ApiError::NotFound(format!("drink {id}")))?
            .try_into()
    }

    #[instrument(skip_all, fields(id = id))]
    async fn update(&self, id: i32, patch: DrinkPatch) -> Result<Drink, ApiError> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let recipe = patch.recipe.as_deref().map(encode_recipe).transpose()?;

        let start = Instant::now();
        let row: Option<DrinkRow> = observe(
            "update",
            start,
            sqlx::query_as(
                r#"
                UPDATE drinks
                SET title = COALESCE($2, title),
                    recipe = COALESCE($3, recipe)
                WHERE id = $1
                RETURNING id, title, recipe
                "#,
            )
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(recipe.as_deref())
            .fetch_optional(&self.pool)
            .await,
        )?;

        row.ok_or_else(|| ApiError::NotFound(format!("drink {id}")))?
            .try_into()
    }

    #[instrument(skip_all, fields(id = id))]
    async fn delete(&self, id: i32) -> Result<i32, ApiError> {
        let start = Instant::now();
        let deleted: Option<i32> = observe(
            "delete",
            start,
            sqlx::query_scalar("DELETE FROM drinks WHERE id = $1 RETURNING id")
                .bind(id)
                .fetch_optional(&self.pool)
                .await,
        )?;

        deleted.ok_or_else(|| ApiError::NotFound(format!("drink {id}")))
    }

    async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Remove every drink, restart the id sequence and insert one sample drink.
///
/// # Errors
///
/// Returns `ApiError::Database` if any statement fails; the transaction is
/// rolled back in that case.
#[instrument(skip_all)]
pub async fn reset_and_seed(pool: &PgPool) -> Result<(), ApiError> {
    let recipe = encode_recipe(&[Ingredient {
        name: "water".to_string(),
        color: "blue".to_string(),
        parts: 1,
    }])?;

    let mut tx = pool.begin().await?;
    sqlx::query("TRUNCATE drinks RESTART IDENTITY")
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO drinks (title, recipe) VALUES ($1, $2)")
        .bind(SEED_DRINK_TITLE)
        .bind(&recipe)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::warn!(target: "drinks.repository", "Drinks table reset and seeded");
    Ok(())
}
