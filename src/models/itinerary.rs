use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder time used when an activity has not been scheduled yet.
pub const UNSCHEDULED_TIME: &str = "미정";
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

fn default_time() -> String {
    UNSCHEDULED_TIME.to_string()
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// One scheduled event within a day.
///
/// Field names on the wire follow the web client (`activity`, `location`,
/// `duration`) which is also the shape the model is asked to produce.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(rename = "activity")]
    pub name: String,
    #[serde(rename = "location", default)]
    pub location_text: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "duration", default = "default_duration")]
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Day {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "day")]
    pub day_number: u32,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A full multi-day plan. Serialises as the bare array of days.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Itinerary {
    pub days: Vec<Day>,
}

impl Itinerary {
    pub fn new(days: Vec<Day>) -> Self {
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|d| d.activities.len()).sum()
    }

    /// Fill in ids and defaults that the model (or an older client) left out.
    pub fn normalize(&mut self) {
        for (day_index, day) in self.days.iter_mut().enumerate() {
            if day.id.trim().is_empty() {
                day.id = format!("plan-{}", day_index);
            }
            for (activity_index, activity) in day.activities.iter_mut().enumerate() {
                if activity.id.trim().is_empty() {
                    activity.id = format!("activity-{}-{}", day_index, activity_index);
                }
                if activity.time.trim().is_empty() {
                    activity.time = default_time();
                }
                if activity.duration_minutes == 0 {
                    activity.duration_minutes = DEFAULT_DURATION_MINUTES;
                }
            }
        }
    }

    /// Order days by their day number and renumber them 1..n.
    pub fn canonicalize(&mut self) {
        self.days.sort_by_key(|d| d.day_number);
        self.renumber();
    }

    pub(crate) fn renumber(&mut self) {
        for (index, day) in self.days.iter_mut().enumerate() {
            day.day_number = index as u32 + 1;
        }
    }
}

/// Optional constraints layered on top of a trip request.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripPreferences {
    #[serde(default)]
    pub must_visit_places: Vec<String>,
    #[serde(default)]
    pub must_do_activities: Vec<String>,
    #[serde(default)]
    pub avoid_places: Vec<String>,
    #[serde(default)]
    pub avoid_activities: Vec<String>,
    pub max_walking_distance_km: Option<f64>,
    pub budget_per_activity: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: u32,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub preferences: Option<TripPreferences>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TripRequestError {
    #[error("destination is required")]
    MissingDestination,
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("at least one traveler is required")]
    NoTravelers,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), TripRequestError> {
        if self.destination.trim().is_empty() {
            return Err(TripRequestError::MissingDestination);
        }
        if self.end_date < self.start_date {
            return Err(TripRequestError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.travelers == 0 {
            return Err(TripRequestError::NoTravelers);
        }
        Ok(())
    }

    /// Inclusive number of calendar days covered by the trip.
    pub fn trip_length_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Payload for appending an activity to a day.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NewActivity {
    pub time: Option<String>,
    pub activity: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
}

/// Partial update of an existing activity.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ActivityPatch {
    pub time: Option<String>,
    pub activity: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Document form of an itinerary as kept by the repository.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredItinerary {
    #[serde(rename = "_id")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub days: Itinerary,
    pub updated_at: DateTime<Utc>,
}

impl StoredItinerary {
    pub fn new(key: impl Into<String>, days: Itinerary) -> Self {
        Self {
            key: key.into(),
            title: None,
            source: None,
            days,
            updated_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, title: Option<String>, source: &str) -> Self {
        self.title = title;
        self.source = Some(source.to_string());
        self
    }
}
