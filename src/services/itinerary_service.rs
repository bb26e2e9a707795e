use uuid::Uuid;

use crate::models::itinerary::{
    Activity, ActivityPatch, Day, Direction, Itinerary, NewActivity, DEFAULT_DURATION_MINUTES,
    UNSCHEDULED_TIME,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ItineraryError {
    #[error("day '{0}' not found")]
    DayNotFound(String),
    #[error("activity '{0}' not found")]
    ActivityNotFound(String),
    #[error("{0} is required")]
    MissingField(&'static str),
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ItineraryError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ItineraryError::MissingField(field)),
    }
}

impl Itinerary {
    fn day_mut(&mut self, day_id: &str) -> Result<&mut Day, ItineraryError> {
        self.days
            .iter_mut()
            .find(|d| d.id == day_id)
            .ok_or_else(|| ItineraryError::DayNotFound(day_id.to_string()))
    }

    pub fn add_activity(
        &mut self,
        day_id: &str,
        input: NewActivity,
    ) -> Result<&Activity, ItineraryError> {
        let name = required(input.activity, "activity")?;
        let location_text = required(input.location, "location")?;

        let day = self.day_mut(day_id)?;
        day.activities.push(Activity {
            id: Uuid::new_v4().to_string(),
            time: input
                .time
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNSCHEDULED_TIME.to_string()),
            name,
            location_text,
            description: input.description.unwrap_or_default(),
            duration_minutes: input
                .duration
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DURATION_MINUTES),
        });

        Ok(&day.activities[day.activities.len() - 1])
    }

    pub fn update_activity(
        &mut self,
        day_id: &str,
        activity_id: &str,
        patch: ActivityPatch,
    ) -> Result<&Activity, ItineraryError> {
        let day = self.day_mut(day_id)?;
        let activity = day
            .activities
            .iter_mut()
            .find(|a| a.id == activity_id)
            .ok_or_else(|| ItineraryError::ActivityNotFound(activity_id.to_string()))?;

        if let Some(time) = patch.time {
            activity.time = time;
        }
        if let Some(name) = patch.activity {
            activity.name = name;
        }
        if let Some(location) = patch.location {
            activity.location_text = location;
        }
        if let Some(description) = patch.description {
            activity.description = description;
        }
        if let Some(duration) = patch.duration.filter(|d| *d > 0) {
            activity.duration_minutes = duration;
        }

        Ok(activity)
    }

    pub fn delete_activity(
        &mut self,
        day_id: &str,
        activity_id: &str,
    ) -> Result<Activity, ItineraryError> {
        let day = self.day_mut(day_id)?;
        let index = day
            .activities
            .iter()
            .position(|a| a.id == activity_id)
            .ok_or_else(|| ItineraryError::ActivityNotFound(activity_id.to_string()))?;
        Ok(day.activities.remove(index))
    }

    /// Swap an activity with its neighbour. Moving past either end is a no-op.
    pub fn move_activity(
        &mut self,
        day_id: &str,
        activity_id: &str,
        direction: Direction,
    ) -> Result<(), ItineraryError> {
        let day = self.day_mut(day_id)?;
        let index = day
            .activities
            .iter()
            .position(|a| a.id == activity_id)
            .ok_or_else(|| ItineraryError::ActivityNotFound(activity_id.to_string()))?;

        match direction {
            Direction::Up if index > 0 => day.activities.swap(index, index - 1),
            Direction::Down if index + 1 < day.activities.len() => {
                day.activities.swap(index, index + 1)
            }
            _ => {}
        }
        Ok(())
    }

    pub fn add_day(&mut self, title: Option<String>) -> &Day {
        let day_number = self.days.len() as u32 + 1;
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("{}일차", day_number));

        self.days.push(Day {
            id: Uuid::new_v4().to_string(),
            title,
            day_number,
            activities: Vec::new(),
        });
        &self.days[self.days.len() - 1]
    }

    /// Drop a day together with its activities and close the numbering gap.
    pub fn remove_day(&mut self, day_id: &str) -> Result<Day, ItineraryError> {
        let index = self
            .days
            .iter()
            .position(|d| d.id == day_id)
            .ok_or_else(|| ItineraryError::DayNotFound(day_id.to_string()))?;
        let removed = self.days.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// `(activity name, location text)` pairs to feed the geocoder, either for
    /// every day or for a single day number.
    pub fn locations(&self, day_number: Option<u32>) -> Vec<(String, String)> {
        self.days
            .iter()
            .filter(|d| day_number.map_or(true, |n| d.day_number == n))
            .flat_map(|d| d.activities.iter())
            .filter(|a| !a.location_text.trim().is_empty())
            .map(|a| (a.name.clone(), a.location_text.clone()))
            .collect()
    }

    /// Plain-text rendering used for sharing.
    pub fn share_text(&self) -> String {
        self.days
            .iter()
            .map(|day| {
                let mut lines = vec![day.title.clone()];
                lines.extend(day.activities.iter().map(|a| {
                    format!("{} - {} ({})", a.time, a.name, a.location_text)
                }));
                lines.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Itinerary {
        let mut itinerary: Itinerary = serde_json::from_str(
            r#"[
                {"title":"1일차 - 해운대","day":1,"activities":[
                    {"time":"10:00","activity":"해수욕장","location":"부산 해운대구 우동"},
                    {"time":"12:00","activity":"밀면","location":"부산 해운대구 구남로 29"},
                    {"time":"15:00","activity":"더베이101","location":"부산 해운대구 동백로 52"}
                ]},
                {"title":"2일차 - 감천","day":2,"activities":[
                    {"time":"10:00","activity":"감천문화마을","location":"부산 사하구 감내2로 203"}
                ]},
                {"title":"3일차 - 귀가","day":3,"activities":[]}
            ]"#,
        )
        .unwrap();
        itinerary.normalize();
        itinerary
    }

    #[test]
    fn test_add_activity_defaults() {
        let mut itinerary = sample();
        let added = itinerary
            .add_activity(
                "plan-1",
                NewActivity {
                    activity: Some("자갈치시장".to_string()),
                    location: Some("부산 중구 자갈치해안로 52".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .clone();

        assert_eq!(added.time, UNSCHEDULED_TIME);
        assert_eq!(added.duration_minutes, 60);
        assert_eq!(itinerary.days[1].activities.len(), 2);
    }

    #[test]
    fn test_add_activity_requires_name_and_location() {
        let mut itinerary = sample();
        let err = itinerary
            .add_activity(
                "plan-0",
                NewActivity {
                    activity: Some("  ".to_string()),
                    location: Some("somewhere".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, ItineraryError::MissingField("activity"));
        assert_eq!(itinerary.activity_count(), 4);
    }

    #[test]
    fn test_update_activity_partial() {
        let mut itinerary = sample();
        itinerary
            .update_activity(
                "plan-0",
                "activity-0-1",
                ActivityPatch {
                    time: Some("13:00".to_string()),
                    duration: Some(90),
                    ..Default::default()
                },
            )
            .unwrap();

        let activity = &itinerary.days[0].activities[1];
        assert_eq!(activity.time, "13:00");
        assert_eq!(activity.duration_minutes, 90);
        assert_eq!(activity.name, "밀면");
    }

    #[test]
    fn test_move_activity_and_boundaries() {
        let mut itinerary = sample();
        itinerary
            .move_activity("plan-0", "activity-0-2", Direction::Up)
            .unwrap();
        let ids: Vec<&str> = itinerary.days[0].activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["activity-0-0", "activity-0-2", "activity-0-1"]);

        itinerary
            .move_activity("plan-0", "activity-0-0", Direction::Up)
            .unwrap();
        assert_eq!(itinerary.days[0].activities[0].id, "activity-0-0");

        assert_eq!(
            itinerary.move_activity("plan-0", "missing", Direction::Down),
            Err(ItineraryError::ActivityNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_delete_activity() {
        let mut itinerary = sample();
        let removed = itinerary.delete_activity("plan-1", "activity-1-0").unwrap();
        assert_eq!(removed.name, "감천문화마을");
        assert!(itinerary.days[1].activities.is_empty());
    }

    #[test]
    fn test_remove_day_renumbers() {
        let mut itinerary = sample();
        let removed = itinerary.remove_day("plan-0").unwrap();
        assert_eq!(removed.activities.len(), 3);

        let numbers: Vec<u32> = itinerary.days.iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(itinerary.activity_count(), 1);
        assert_eq!(
            itinerary.remove_day("plan-0"),
            Err(ItineraryError::DayNotFound("plan-0".to_string()))
        );
    }

    #[test]
    fn test_add_day_numbers_sequentially() {
        let mut itinerary = sample();
        let day = itinerary.add_day(None).clone();
        assert_eq!(day.day_number, 4);
        assert_eq!(day.title, "4일차");
    }

    #[test]
    fn test_locations_filter_by_day() {
        let itinerary = sample();
        assert_eq!(itinerary.locations(None).len(), 4);

        let second = itinerary.locations(Some(2));
        assert_eq!(
            second,
            vec![("감천문화마을".to_string(), "부산 사하구 감내2로 203".to_string())]
        );
        assert!(itinerary.locations(Some(3)).is_empty());
    }

    #[test]
    fn test_share_text() {
        let text = sample().share_text();
        assert!(text.starts_with("1일차 - 해운대\n10:00 - 해수욕장 (부산 해운대구 우동)"));
        assert!(text.contains("\n\n2일차 - 감천\n10:00 - 감천문화마을"));
    }
}
