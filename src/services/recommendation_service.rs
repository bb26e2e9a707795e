//! Shared trips and curated templates.
//!
//! Filtering and sorting happen in memory after loading the catalogue; the
//! catalogue is small and the same code path then serves both stores.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use log::{error, info};

use crate::models::itinerary::{Itinerary, StoredItinerary};
use crate::models::recommendation::{
    NewRecommendation, RecommendationFacets, RecommendationFilters, RecommendedPlan, SortBy,
    UserRecommendation,
};
use crate::repository::{Repository, RepositoryError, TravelRepository};

const SEED_RECOMMENDATIONS: &str = include_str!("../data/recommendations.json");
const TEMPLATES: &str = include_str!("../data/templates.json");

pub const SOURCE_RECOMMENDATION: &str = "recommendation";
pub const SOURCE_TEMPLATE: &str = "template";

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("recommendation '{0}' not found")]
    NotFound(String),
    #[error("template '{0}' not found")]
    TemplateNotFound(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The catalogue loaded into an empty store on start-up.
pub fn seed_recommendations() -> Vec<UserRecommendation> {
    serde_json::from_str(SEED_RECOMMENDATIONS).unwrap_or_else(|e| {
        error!("Bundled recommendations are invalid: {}", e);
        Vec::new()
    })
}

pub fn templates() -> &'static [RecommendedPlan] {
    static TEMPLATE_LIST: OnceLock<Vec<RecommendedPlan>> = OnceLock::new();
    TEMPLATE_LIST.get_or_init(|| {
        serde_json::from_str(TEMPLATES).unwrap_or_else(|e| {
            error!("Bundled templates are invalid: {}", e);
            Vec::new()
        })
    })
}

pub fn find_template(id: &str) -> Option<&'static RecommendedPlan> {
    templates().iter().find(|t| t.id == id)
}

/// Parse `"min-max"` or an open-ended `"min"` day range.
pub fn parse_duration_range(range: &str) -> Option<(u32, Option<u32>)> {
    let range = range.trim().trim_end_matches('+');
    match range.split_once('-') {
        Some((min, max)) => Some((min.trim().parse().ok()?, Some(max.trim().parse().ok()?))),
        None => Some((range.parse().ok()?, None)),
    }
}

fn requested(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "all")
}

fn matches_filters(recommendation: &UserRecommendation, filters: &RecommendationFilters) -> bool {
    if let Some(search) = requested(&filters.search) {
        let needle = search.to_lowercase();
        let haystacks = [
            &recommendation.title,
            &recommendation.description,
            &recommendation.location,
            &recommendation.author,
        ];
        let hit = haystacks.iter().any(|h| h.to_lowercase().contains(&needle))
            || recommendation
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }

    if let Some(location) = requested(&filters.location) {
        if recommendation.location != location {
            return false;
        }
    }

    if let Some(range) = requested(&filters.duration) {
        if let Some((min, max)) = parse_duration_range(range) {
            if recommendation.duration < min || max.map_or(false, |m| recommendation.duration > m) {
                return false;
            }
        }
    }

    if let Some(budget) = requested(&filters.budget) {
        if recommendation.budget != budget {
            return false;
        }
    }
    if let Some(season) = requested(&filters.season) {
        if recommendation.season != season {
            return false;
        }
    }
    if let Some(style) = requested(&filters.travel_style) {
        if recommendation.travel_style != style {
            return false;
        }
    }

    if let Some(tags) = requested(&filters.tags) {
        let wanted: Vec<&str> = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !wanted.is_empty() && !wanted.iter().any(|w| recommendation.tags.iter().any(|t| t == w)) {
            return false;
        }
    }

    true
}

/// Apply filters, then sort.
pub fn filter_recommendations(
    recommendations: Vec<UserRecommendation>,
    filters: &RecommendationFilters,
) -> Vec<UserRecommendation> {
    let mut matched: Vec<UserRecommendation> = recommendations
        .into_iter()
        .filter(|r| matches_filters(r, filters))
        .collect();

    match filters.sort_by {
        SortBy::Popular => matched.sort_by(|a, b| b.likes.cmp(&a.likes)),
        SortBy::Rating => matched.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortBy::Latest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    matched
}

pub fn facets(recommendations: &[UserRecommendation]) -> RecommendationFacets {
    fn unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
        values
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    RecommendationFacets {
        locations: unique(recommendations.iter().map(|r| &r.location)),
        budgets: unique(recommendations.iter().map(|r| &r.budget)),
        seasons: unique(recommendations.iter().map(|r| &r.season)),
        travel_styles: unique(recommendations.iter().map(|r| &r.travel_style)),
        tags: unique(recommendations.iter().flat_map(|r| r.tags.iter())),
    }
}

/// Toggle `user_id`'s like. Returns whether the user now likes it.
pub fn toggle_like(recommendation: &mut UserRecommendation, user_id: &str) -> bool {
    match recommendation.liked_by.iter().position(|u| u == user_id) {
        Some(index) => {
            recommendation.liked_by.remove(index);
            recommendation.likes = recommendation.likes.saturating_sub(1);
            false
        }
        None => {
            recommendation.liked_by.push(user_id.to_string());
            recommendation.likes += 1;
            true
        }
    }
}

/// A copy of someone else's plan, ready to be edited as one's own.
pub fn copy_plans(plans: &Itinerary) -> Itinerary {
    let mut copy = plans.clone();
    copy.normalize();
    copy.canonicalize();
    copy
}

pub fn build_recommendation(input: NewRecommendation) -> Result<UserRecommendation, RecommendationError> {
    if input.title.trim().is_empty() {
        return Err(RecommendationError::MissingField("title"));
    }
    if input.location.trim().is_empty() {
        return Err(RecommendationError::MissingField("location"));
    }
    if input.plans.is_empty() {
        return Err(RecommendationError::MissingField("plans"));
    }

    Ok(UserRecommendation {
        id: format!("user-rec-{}", uuid::Uuid::new_v4()),
        title: input.title.trim().to_string(),
        description: input.description,
        author: input.author,
        author_avatar: input.author_avatar,
        location: input.location.trim().to_string(),
        duration: input.duration,
        tags: input.tags,
        rating: input.rating.clamp(0.0, 5.0),
        budget: input.budget,
        season: input.season,
        travel_style: input.travel_style,
        plans: copy_plans(&input.plans),
        photos: input.photos,
        tips: input.tips,
        created_at: Utc::now().date_naive(),
        likes: 0,
        views: 0,
        is_recommended: false,
        liked_by: Vec::new(),
    })
}

pub struct RecommendationService {
    repository: Arc<Repository>,
}

impl RecommendationService {
    pub fn new(repository: Arc<Repository>) -> Self {
        Self { repository }
    }

    pub async fn search(
        &self,
        filters: &RecommendationFilters,
    ) -> Result<Vec<UserRecommendation>, RecommendationError> {
        let all = self.repository.list_recommendations().await?;
        Ok(filter_recommendations(all, filters))
    }

    pub async fn facets(&self) -> Result<RecommendationFacets, RecommendationError> {
        Ok(facets(&self.repository.list_recommendations().await?))
    }

    pub async fn add(
        &self,
        input: NewRecommendation,
    ) -> Result<UserRecommendation, RecommendationError> {
        let recommendation = build_recommendation(input)?;
        self.repository.save_recommendation(&recommendation).await?;
        info!("Added recommendation {}", recommendation.id);
        Ok(recommendation)
    }

    pub async fn like(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<UserRecommendation, RecommendationError> {
        let mut recommendation = self.find(id).await?;
        toggle_like(&mut recommendation, user_id);
        self.repository.save_recommendation(&recommendation).await?;
        Ok(recommendation)
    }

    /// Copy a recommendation's plan into `key` and count the view.
    pub async fn use_in_plan(
        &self,
        id: &str,
        key: &str,
    ) -> Result<StoredItinerary, RecommendationError> {
        let mut recommendation = self.find(id).await?;
        recommendation.views += 1;
        self.repository.save_recommendation(&recommendation).await?;

        let stored = StoredItinerary::new(key, copy_plans(&recommendation.plans))
            .with_source(Some(recommendation.title.clone()), SOURCE_RECOMMENDATION);
        self.repository.save_itinerary(&stored).await?;
        info!("Plan '{}' now follows recommendation {}", key, id);
        Ok(stored)
    }

    pub async fn use_template(
        &self,
        template_id: &str,
        key: &str,
    ) -> Result<StoredItinerary, RecommendationError> {
        let template = find_template(template_id)
            .ok_or_else(|| RecommendationError::TemplateNotFound(template_id.to_string()))?;

        let stored = StoredItinerary::new(key, copy_plans(&template.plans))
            .with_source(Some(template.title.clone()), SOURCE_TEMPLATE);
        self.repository.save_itinerary(&stored).await?;
        Ok(stored)
    }

    async fn find(&self, id: &str) -> Result<UserRecommendation, RecommendationError> {
        self.repository
            .find_recommendation(id)
            .await?
            .ok_or_else(|| RecommendationError::NotFound(id.to_string()))
    }
}
