//! Persistence for plans and shared recommendations.
//!
//! Handlers talk to [`Repository`], which is either backed by MongoDB or by a
//! process-local map when no `MONGODB_URI` is configured.

use std::collections::HashMap;
use std::sync::Arc;

use futures::TryStreamExt;
use log::info;
use mongodb::{bson::doc, Client, Collection, Database};
use tokio::sync::RwLock;

use crate::models::itinerary::StoredItinerary;
use crate::models::recommendation::UserRecommendation;

const ITINERARY_COLLECTION: &str = "Itineraries";
const RECOMMENDATION_COLLECTION: &str = "Recommendations";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

pub trait TravelRepository {
    async fn load_itinerary(&self, key: &str) -> Result<Option<StoredItinerary>, RepositoryError>;
    async fn save_itinerary(&self, itinerary: &StoredItinerary) -> Result<(), RepositoryError>;
    /// Returns whether anything was stored under `key`.
    async fn delete_itinerary(&self, key: &str) -> Result<bool, RepositoryError>;

    async fn list_recommendations(&self) -> Result<Vec<UserRecommendation>, RepositoryError>;
    async fn find_recommendation(
        &self,
        id: &str,
    ) -> Result<Option<UserRecommendation>, RepositoryError>;
    /// Insert or replace by id.
    async fn save_recommendation(
        &self,
        recommendation: &UserRecommendation,
    ) -> Result<(), RepositoryError>;
}

pub struct MongoRepository {
    db: Database,
    itineraries: Collection<StoredItinerary>,
    recommendations: Collection<UserRecommendation>,
}

impl MongoRepository {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        let db = client.database(database);
        Self {
            itineraries: db.collection(ITINERARY_COLLECTION),
            recommendations: db.collection(RECOMMENDATION_COLLECTION),
            db,
        }
    }
}

impl TravelRepository for MongoRepository {
    async fn load_itinerary(&self, key: &str) -> Result<Option<StoredItinerary>, RepositoryError> {
        Ok(self.itineraries.find_one(doc! { "_id": key }).await?)
    }

    async fn save_itinerary(&self, itinerary: &StoredItinerary) -> Result<(), RepositoryError> {
        self.itineraries
            .replace_one(doc! { "_id": itinerary.key.as_str() }, itinerary)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_itinerary(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = self.itineraries.delete_one(doc! { "_id": key }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_recommendations(&self) -> Result<Vec<UserRecommendation>, RepositoryError> {
        let cursor = self
            .recommendations
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_recommendation(
        &self,
        id: &str,
    ) -> Result<Option<UserRecommendation>, RepositoryError> {
        Ok(self.recommendations.find_one(doc! { "_id": id }).await?)
    }

    async fn save_recommendation(
        &self,
        recommendation: &UserRecommendation,
    ) -> Result<(), RepositoryError> {
        self.recommendations
            .replace_one(doc! { "_id": recommendation.id.as_str() }, recommendation)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRepository {
    itineraries: RwLock<HashMap<String, StoredItinerary>>,
    recommendations: RwLock<Vec<UserRecommendation>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TravelRepository for InMemoryRepository {
    async fn load_itinerary(&self, key: &str) -> Result<Option<StoredItinerary>, RepositoryError> {
        Ok(self.itineraries.read().await.get(key).cloned())
    }

    async fn save_itinerary(&self, itinerary: &StoredItinerary) -> Result<(), RepositoryError> {
        self.itineraries
            .write()
            .await
            .insert(itinerary.key.clone(), itinerary.clone());
        Ok(())
    }

    async fn delete_itinerary(&self, key: &str) -> Result<bool, RepositoryError> {
        Ok(self.itineraries.write().await.remove(key).is_some())
    }

    async fn list_recommendations(&self) -> Result<Vec<UserRecommendation>, RepositoryError> {
        Ok(self.recommendations.read().await.clone())
    }

    async fn find_recommendation(
        &self,
        id: &str,
    ) -> Result<Option<UserRecommendation>, RepositoryError> {
        Ok(self
            .recommendations
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn save_recommendation(
        &self,
        recommendation: &UserRecommendation,
    ) -> Result<(), RepositoryError> {
        let mut recommendations = self.recommendations.write().await;
        match recommendations.iter_mut().find(|r| r.id == recommendation.id) {
            Some(existing) => *existing = recommendation.clone(),
            None => recommendations.push(recommendation.clone()),
        }
        Ok(())
    }
}

/// The store selected at start-up.
pub enum Repository {
    Mongo(MongoRepository),
    InMemory(InMemoryRepository),
}

impl Repository {
    pub fn backend(&self) -> &'static str {
        match self {
            Repository::Mongo(_) => "mongodb",
            Repository::InMemory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Repository::Mongo(repo) = self {
            repo.db.run_command(doc! { "ping": 1 }).await?;
        }
        Ok(())
    }

    /// Store the bundled catalogue when no recommendations exist yet.
    pub async fn seed_recommendations(
        &self,
        seed: &[UserRecommendation],
    ) -> Result<usize, RepositoryError> {
        if !self.list_recommendations().await?.is_empty() {
            return Ok(0);
        }
        for recommendation in seed {
            self.save_recommendation(recommendation).await?;
        }
        info!("Seeded {} recommendations into {}", seed.len(), self.backend());
        Ok(seed.len())
    }
}

impl TravelRepository for Repository {
    async fn load_itinerary(&self, key: &str) -> Result<Option<StoredItinerary>, RepositoryError> {
        match self {
            Repository::Mongo(repo) => repo.load_itinerary(key).await,
            Repository::InMemory(repo) => repo.load_itinerary(key).await,
        }
    }

    async fn save_itinerary(&self, itinerary: &StoredItinerary) -> Result<(), RepositoryError> {
        match self {
            Repository::Mongo(repo) => repo.save_itinerary(itinerary).await,
            Repository::InMemory(repo) => repo.save_itinerary(itinerary).await,
        }
    }

    async fn delete_itinerary(&self, key: &str) -> Result<bool, RepositoryError> {
        match self {
            Repository::Mongo(repo) => repo.delete_itinerary(key).await,
            Repository::InMemory(repo) => repo.delete_itinerary(key).await,
        }
    }

    async fn list_recommendations(&self) -> Result<Vec<UserRecommendation>, RepositoryError> {
        match self {
            Repository::Mongo(repo) => repo.list_recommendations().await,
            Repository::InMemory(repo) => repo.list_recommendations().await,
        }
    }

    async fn find_recommendation(
        &self,
        id: &str,
    ) -> Result<Option<UserRecommendation>, RepositoryError> {
        match self {
            Repository::Mongo(repo) => repo.find_recommendation(id).await,
            Repository::InMemory(repo) => repo.find_recommendation(id).await,
        }
    }

    async fn save_recommendation(
        &self,
        recommendation: &UserRecommendation,
    ) -> Result<(), RepositoryError> {
        match self {
            Repository::Mongo(repo) => repo.save_recommendation(recommendation).await,
            Repository::InMemory(repo) => repo.save_recommendation(recommendation).await,
        }
    }
}
