use crate::error::ActivityError;
use crate::types::{Activity, Point};
use chrono::{DateTime, Utc};
use gpx::{Gpx, Waypoint};
use std::io::Cursor;

const UNKNOWN_TYPE: &str = "Unknown Type";
const UNKNOWN_CREATOR: &str = "Unknown Creator";

/// Normalize a GPX export. Producers filter out fixless samples themselves,
/// so every track point is kept.
pub fn parse_gpx(raw_data: &[u8]) -> Result<(Activity, Vec<Point>), ActivityError> {
    let gpx: Gpx =
        gpx::read(Cursor::new(raw_data)).map_err(|e| ActivityError::GpxDecode(e.to_string()))?;

    let mut activity = Activity {
        description: format!(
            "Created by {}",
            gpx.creator.as_deref().unwrap_or(UNKNOWN_CREATOR)
        ),
        title: UNKNOWN_TYPE.to_string(),
        ..Activity::default()
    };

    let mut points = Vec::new();
    let mut first_time = None;
    let mut last_time = None;

    // each track overwrites the title, so the last track names the activity
    for track in &gpx.tracks {
        activity.title = track.name.clone().unwrap_or_else(|| UNKNOWN_TYPE.to_string());

        for segment in &track.segments {
            for track_point in &segment.points {
                let time = waypoint_time(track_point)?;
                if points.is_empty() {
                    first_time = time;
                }
                last_time = time;
                points.push(to_point(track_point, time));
            }
        }
    }

    // bounds come from the emitted points and need at least two of them
    if points.len() >= 2
        && let (Some(start), Some(end)) = (first_time, last_time)
    {
        activity.start_time = Some(start);
        activity.end_time = Some(end);
    }

    Ok((activity, points))
}

/// A point without `<time>` is stamped with the Unix epoch.
fn to_point(waypoint: &Waypoint, time: Option<DateTime<Utc>>) -> Point {
    let position = waypoint.point();

    let mut point = Point::new(
        time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        position.y(),
        position.x(),
    );
    point.altitude = waypoint.elevation.unwrap_or(0.0);
    point.accuracy = waypoint.hdop.unwrap_or(0.0);
    point.vertical_accuracy = waypoint.vdop.unwrap_or(0.0);
    point
}

/// `None` when the point has no `<time>`; such a point never bounds the activity.
fn waypoint_time(waypoint: &Waypoint) -> Result<Option<DateTime<Utc>>, ActivityError> {
    let Some(time) = &waypoint.time else {
        return Ok(None);
    };

    let iso = time
        .format()
        .map_err(|e| ActivityError::GpxDecode(e.to_string()))?;
    let utc = DateTime::parse_from_rfc3339(&iso)
        .map_err(|e| ActivityError::GpxDecode(e.to_string()))?
        .with_timezone(&Utc);

    Ok(Some(utc))
}
