use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::itinerary::Itinerary;

/// A trip shared by another traveler.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecommendation {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub location: String,
    /// Trip length in days.
    pub duration: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub rating: f32,
    pub budget: String,
    pub season: String,
    pub travel_style: String,
    pub plans: Itinerary,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub liked_by: Vec<String>,
}

/// Body of a new recommendation. Id, date and counters are assigned on insert.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewRecommendation {
    pub title: String,
    pub description: String,
    pub author: String,
    pub author_avatar: Option<String>,
    pub location: String,
    pub duration: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f32,
    pub budget: String,
    pub season: String,
    pub travel_style: String,
    pub plans: Itinerary,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Latest,
    Popular,
    Rating,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationFilters {
    pub search: Option<String>,
    pub location: Option<String>,
    /// Either `"min-max"` or `"min"` (open ended), in days.
    pub duration: Option<String>,
    pub budget: Option<String>,
    pub season: Option<String>,
    pub travel_style: Option<String>,
    /// Comma separated when passed as a query string.
    pub tags: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationFacets {
    pub locations: Vec<String>,
    pub budgets: Vec<String>,
    pub seasons: Vec<String>,
    pub travel_styles: Vec<String>,
    pub tags: Vec<String>,
}

/// Curated itinerary template shipped with the service.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecommendedPlan {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub duration: String,
    pub purpose: String,
    pub description: String,
    pub plans: Itinerary,
}
