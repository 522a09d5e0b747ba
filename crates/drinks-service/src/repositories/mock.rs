//! In-memory drink repository for tests.
//!
//! Mirrors the PostgreSQL repository's observable behavior: ids start at 1
//! and are never reused, titles are unique, and lists are ordered by id.

use crate::errors::ApiError;
use crate::models::{Drink, DrinkPatch, NewDrink};
use crate::repositories::{DrinkRepository, DUPLICATE_TITLE_MESSAGE};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    next_id: i32,
    drinks: BTreeMap<i32, Drink>,
}

/// Drink repository held entirely in memory.
#[derive(Default)]
pub struct InMemoryDrinkRepository {
    store: RwLock<Store>,
    unavailable: AtomicBool,
    call_count: AtomicUsize,
}

impl InMemoryDrinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `drinks`, assigning ids in order.
    pub async fn with_drinks(drinks: Vec<NewDrink>) -> Result<Self, ApiError> {
        let repository = Self::new();
        for drink in drinks {
            repository.create(drink).await?;
        }
        Ok(repository)
    }

    /// Make every operation fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of repository calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Snapshot of all stored drinks, ordered by id.
    pub async fn snapshot(&self) -> Vec<Drink> {
        self.store.read().await.drinks.values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), ApiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::Database("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

fn title_taken(store: &Store, title: &str, except: Option<i32>) -> bool {
    store
        .drinks
        .values()
        .any(|drink| drink.title == title && Some(drink.id) != except)
}

#[async_trait]
impl DrinkRepository for InMemoryDrinkRepository {
    async fn list(&self) -> Result<Vec<Drink>, ApiError> {
        self.check_available()?;
        Ok(self.snapshot().await)
    }

    async fn create(&self, drink: NewDrink) -> Result<Drink, ApiError> {
        self.check_available()?;
        let mut store = self.store.write().await;

        if title_taken(&store, &drink.title, None) {
            return Err(ApiError::Unprocessable(DUPLICATE_TITLE_MESSAGE.to_string()));
        }

        store.next_id += 1;
        let created = Drink {
            id: store.next_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        store.drinks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i32) -> Result<Drink, ApiError> {
        self.check_available()?;
        self.store
            .read()
            .await
            .drinks
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("drink {id}")))
    }

    async fn update(&self, id: i32, patch: DrinkPatch) -> Result<Drink, ApiError> {
        self.check_available()?;
        let mut store = self.store.write().await;

        if !store.drinks.contains_key(&id) {
            return Err(ApiError::NotFound(format!("drink {id}")));
        }
        if let Some(title) = &patch.title {
            if title_taken(&store, title, Some(id)) {
                return Err(ApiError::Unprocessable(DUPLICATE_TITLE_MESSAGE.to_string()));
            }
        }

        let drink = store
            .drinks
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("drink {id}")))?;
        if let Some(title) = patch.title {
            drink.title = title;
        }
        if let Some(recipe) = patch.recipe {
            drink.recipe = recipe;
        }
        Ok(drink.clone())
    }

    async fn delete(&self, id: i32) -> Result<i32, ApiError> {
        self.check_available()?;
        self.store
            .write()
            .await
            .drinks
            .remove(&id)
            .map(|drink| drink.id)
            .ok_or_else(|| ApiError::NotFound(format!("drink {id}")))
    }

    async fn ping(&self) -> Result<(), ApiError> {
        self.check_available()
    }
}
