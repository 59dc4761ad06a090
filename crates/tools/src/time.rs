//! Current time lookup for a closed set of cities

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Name the mediator matches on for location reference resolution
pub const TOOL_NAME: &str = "get_time";

/// Lookup key, display name, zone
const LOCATIONS: &[(&str, &str, Tz)] = &[
    ("cape town", "Cape Town", Tz::Africa__Johannesburg),
    ("capetown", "Cape Town", Tz::Africa__Johannesburg),
    ("new york", "New York", Tz::America__New_York),
    ("newyork", "New York", Tz::America__New_York),
    ("bangkok", "Bangkok", Tz::Asia__Bangkok),
    ("london", "London", Tz::Europe__London),
    ("tokyo", "Tokyo", Tz::Asia__Tokyo),
    ("utc", "UTC", Tz::UTC),
];

/// Sorted lookup keys
pub fn supported_locations() -> Vec<&'static str> {
    let mut keys: Vec<&str> = LOCATIONS.iter().map(|(key, _, _)| *key).collect();
    keys.sort_unstable();
    keys
}

/// Current time at `location`, or an explanatory error text
pub fn get_time(location: &str) -> String {
    get_time_at(location, Utc::now())
}

/// Same as [`get_time`] with an explicit clock
pub fn get_time_at(location: &str, now: DateTime<Utc>) -> String {
    let key = location.trim().to_lowercase();

    let Some((_, display, tz)) = LOCATIONS.iter().find(|(k, _, _)| *k == key) else {
        debug!("Unsupported location: {}", location);
        return format!(
            "Error: Location '{}' not supported. Available locations: {}.",
            location,
            supported_locations().join(", ")
        );
    };

    let local = now.with_timezone(tz);
    format!(
        "The current time in {} is {} on {}",
        display,
        local.format("%I:%M %p %Z"),
        local.format("%A, %B %d, %Y")
    )
}
