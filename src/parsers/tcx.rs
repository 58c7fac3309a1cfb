use crate::error::ActivityError;
use crate::types::{Activity, Point};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const UNKNOWN_CREATOR: &str = "Unknown Creator";
const UNKNOWN_SPORT: &str = "Unknown Sport";

// Indoor trainer apps export placeholder coordinates.
const VIRTUAL_CREATORS: [&str; 2] = ["KinomapVirtualRide", "TrainerRoad"];

/// Root of a TCX document. Elements match by local name, so prefixed
/// extensions like `ns3:TPX` resolve without namespace handling.
#[derive(Debug, Deserialize)]
struct TrainingCenterDatabase {
    #[serde(rename = "Activities", default)]
    activities: Option<Activities>,
}

#[derive(Debug, Default, Deserialize)]
struct Activities {
    #[serde(rename = "Activity", default)]
    activity: Vec<TcxActivity>,
}

#[derive(Debug, Deserialize)]
struct TcxActivity {
    #[serde(rename = "@Sport", default)]
    sport: Option<String>,
    #[serde(rename = "Lap", default)]
    laps: Vec<Lap>,
    #[serde(rename = "Creator", default)]
    creator: Option<Creator>,
}

#[derive(Debug, Deserialize)]
struct Creator {
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Lap {
    #[serde(rename = "Track", default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "Trackpoint", default)]
    trackpoints: Vec<Trackpoint>,
}

#[derive(Debug, Deserialize)]
struct Trackpoint {
    #[serde(rename = "Time")]
    time: DateTime<Utc>,
    #[serde(rename = "Position", default)]
    position: Option<Position>,
    #[serde(rename = "AltitudeMeters", default)]
    altitude: Option<f64>,
    #[serde(rename = "Extensions", default)]
    extensions: Option<Extensions>,
}

#[derive(Debug, Deserialize)]
struct Position {
    #[serde(rename = "LatitudeDegrees")]
    latitude: f64,
    #[serde(rename = "LongitudeDegrees")]
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct Extensions {
    #[serde(rename = "TPX", default)]
    tpx: Option<Tpx>,
}

#[derive(Debug, Deserialize)]
struct Tpx {
    #[serde(rename = "Speed", default)]
    speed: Option<f64>,
}

impl TcxActivity {
    fn creator_name(&self) -> Option<&str> {
        self.creator
            .as_ref()
            .and_then(|creator| creator.name.as_deref())
            // exports pad names with whitespace
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    fn trackpoints(&self) -> impl Iterator<Item = &Trackpoint> {
        self.laps
            .iter()
            .flat_map(|lap| &lap.tracks)
            .flat_map(|track| &track.trackpoints)
    }
}

impl Trackpoint {
    fn to_point(&self) -> Point {
        let (latitude, longitude) = self
            .position
            .as_ref()
            .map_or((0.0, 0.0), |p| (p.latitude, p.longitude));

        let mut point = Point::new(self.time, latitude, longitude);
        point.altitude = self.altitude.unwrap_or(0.0);
        point.velocity = self
            .extensions
            .as_ref()
            .and_then(|ext| ext.tpx.as_ref())
            .and_then(|tpx| tpx.speed)
            .unwrap_or(0.0);
        point
    }
}

/// Normalize a Training Center XML export.
///
/// Time bounds cover every trackpoint, including the ones later dropped for
/// missing positions or virtual creators.
pub fn parse_tcx(raw_data: &[u8]) -> Result<(Activity, Vec<Point>), ActivityError> {
    let xml = std::str::from_utf8(raw_data).map_err(|e| ActivityError::TcxDecode(e.to_string()))?;
    let db: TrainingCenterDatabase =
        quick_xml::de::from_str(xml).map_err(|e| ActivityError::TcxDecode(e.to_string()))?;

    let mut creator: Option<&str> = None;
    let mut sport: Option<&str> = None;
    let mut activity = Activity::default();
    let mut points = Vec::new();

    let tcx_activities = db.activities.as_ref().map_or(&[][..], |a| a.activity.as_slice());

    for tcx_activity in tcx_activities {
        let creator_name = tcx_activity.creator_name();
        if creator.is_none() {
            creator = creator_name;
        }
        if sport.is_none() {
            sport = tcx_activity
                .sport
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty());
        }

        let is_virtual = creator_name.is_some_and(|name| VIRTUAL_CREATORS.contains(&name));
        if is_virtual {
            tracing::trace!(creator = ?creator_name, "dropping positions from virtual ride");
        }

        for trackpoint in tcx_activity.trackpoints() {
            activity.start_time.get_or_insert(trackpoint.time);
            activity.end_time = Some(trackpoint.time);

            let point = trackpoint.to_point();
            if !point.has_fix() || is_virtual {
                continue;
            }
            points.push(point);
        }
    }

    let creator = creator.unwrap_or(UNKNOWN_CREATOR);
    let sport = match sport.unwrap_or(UNKNOWN_SPORT) {
        "Biking" if VIRTUAL_CREATORS.contains(&creator) => "Indoor Cycling",
        other => other,
    };

    activity.title = sport.to_string();
    activity.description = format!("Created by {creator}");

    Ok((activity, points))
}
