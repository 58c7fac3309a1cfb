use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one imported recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub title: String,
    pub description: String,
    /// `None` when the source gave no usable bounds.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A single location sample. Values the source does not carry are `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp: DateTime<Utc>,

    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,

    pub accuracy: f64,
    pub vertical_accuracy: f64,

    pub velocity: f64,
}

impl Point {
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Point {
            timestamp,
            latitude,
            longitude,
            altitude: 0.0,
            accuracy: 0.0,
            vertical_accuracy: 0.0,
            velocity: 0.0,
        }
    }

    /// A coordinate of exactly zero means the device had no GPS fix.
    pub fn has_fix(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}
