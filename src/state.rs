use std::sync::Arc;

use log::info;

use crate::config::AppConfig;
use crate::db::mongo::create_mongo_client;
use crate::repository::{InMemoryRepository, MongoRepository, Repository, RepositoryError};
use crate::services::collaboration_service::CollaborationService;
use crate::services::gemini_service::GeminiService;
use crate::services::geocoding_service::GeocodingService;
use crate::services::itinerary_generation_service::ItineraryGenerator;
use crate::services::plan_chat_service::PlanChatService;
use crate::services::recommendation_service::{seed_recommendations, RecommendationService};
use crate::services::request_sequencer::RequestSequencer;
use crate::services::route_optimization_service::{EndpointPolicy, RouteOptimizationService};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not connect to MongoDB: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Everything the handlers share, built once at start-up.
pub struct AppState {
    pub config: AppConfig,
    pub repository: Arc<Repository>,
    pub generator: ItineraryGenerator,
    pub chat: PlanChatService,
    pub geocoder: GeocodingService,
    pub router: RouteOptimizationService,
    pub recommendations: RecommendationService,
    pub collaboration: CollaborationService,
    pub sequencer: RequestSequencer,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository) -> Result<Self, StartupError> {
        let gemini = GeminiService::new(&config.gemini)?;
        let geocoder = GeocodingService::new(&config.maps)?;
        let policy = if config.pin_route_destination {
            EndpointPolicy::OriginAndDestination
        } else {
            EndpointPolicy::OriginOnly
        };
        let repository = Arc::new(repository);

        Ok(Self {
            generator: ItineraryGenerator::new(gemini.clone()),
            chat: PlanChatService::new(gemini),
            router: RouteOptimizationService::new(Some(geocoder.clone()), policy),
            geocoder,
            recommendations: RecommendationService::new(repository.clone()),
            collaboration: CollaborationService::new(),
            sequencer: RequestSequencer::new(),
            repository,
            config,
        })
    }

    /// Pick the store from the configuration and seed it.
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let repository = match config.mongodb_uri.as_deref() {
            Some(uri) => {
                let client = create_mongo_client(uri, &config.mongodb_database).await?;
                Repository::Mongo(MongoRepository::new(client, &config.mongodb_database))
            }
            None => {
                info!("MONGODB_URI not set, keeping plans in memory");
                Repository::InMemory(InMemoryRepository::new())
            }
        };
        repository
            .seed_recommendations(&seed_recommendations())
            .await?;

        Self::new(config, repository)
    }
}
