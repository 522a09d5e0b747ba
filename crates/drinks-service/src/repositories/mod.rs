//! Drinks service repositories.
//!
//! [`DrinkRepository`] is the persistence boundary for the drink entity.
//! Handlers hold it as `Arc<dyn DrinkRepository>`; production uses
//! [`PgDrinkRepository`], tests use [`mock::InMemoryDrinkRepository`].

pub mod drinks;
pub mod mock;

pub use drinks::PgDrinkRepository;

use crate::errors::ApiError;
use crate::models::{Drink, DrinkPatch, NewDrink};
use async_trait::async_trait;

/// Message reported when a title is already taken.
pub const DUPLICATE_TITLE_MESSAGE: &str = "A drink with this title already exists";

/// Persistence operations on drinks.
///
/// Errors use `ApiError` directly:
/// - `Unprocessable` for a duplicate title or stored data that cannot be read
/// - `NotFound` when no drink has the requested id
/// - `Database` for storage failures
#[async_trait]
pub trait DrinkRepository: Send + Sync {
    /// All drinks, ordered by ascending id.
    async fn list(&self) -> Result<Vec<Drink>, ApiError>;

    /// Insert a drink. Fails with `Unprocessable` if the title is taken.
    async fn create(&self, drink: NewDrink) -> Result<Drink, ApiError>;

    /// Fetch one drink.
    async fn get(&self, id: i32) -> Result<Drink, ApiError>;

    /// Apply the fields present in `patch` and return the updated drink.
    async fn update(&self, id: i32, patch: DrinkPatch) -> Result<Drink, ApiError>;

    /// Remove a drink, returning its id.
    async fn delete(&self, id: i32) -> Result<i32, ApiError>;

    /// Check storage connectivity.
    async fn ping(&self) -> Result<(), ApiError>;
}
