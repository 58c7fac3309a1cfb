use crate::error::ActivityError;
use crate::types::{Activity, Point};
use chrono::{DateTime, Utc};
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

const UNKNOWN_TYPE: &str = "Unknown Type";
const UNKNOWN_DEVICE: &str = "Unknown Device";

// Forerunner 745 reports an empty product name.
const FORERUNNER_745_ID: u16 = 3589;
const FORERUNNER_745_KEY: &str = "fr745";
const FORERUNNER_745_NAME: &str = "Forerunner 745";

// Only these manufacturers record trustworthy positions.
const POSITION_MANUFACTURERS: [&str; 2] = ["garmin", "wahoo_fitness"];
const POSITION_MANUFACTURER_IDS: [u16; 2] = [1, 32];

const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/**
 * Normalize FIT activity files as written by Garmin, Wahoo and indoor trainer apps.
 */
pub fn parse_fit(raw_data: &[u8]) -> Result<(Activity, Vec<Point>), ActivityError> {
    let fit_file =
        fitparser::from_bytes(raw_data).map_err(|e| ActivityError::FitDecode(e.to_string()))?;

    let file_id = fit_file
        .iter()
        .find(|record| record.kind() == MesgNum::FileId)
        .ok_or(ActivityError::MissingActivity)?;
    if !is_activity_file(file_id) {
        return Err(ActivityError::MissingActivity);
    }

    let manufacturer = field_value(file_id, "manufacturer");
    let title = derive_title(&fit_file);
    let device = derive_device(&fit_file);

    let keep_positions = manufacturer.is_some_and(records_positions);
    if !keep_positions {
        tracing::trace!(
            manufacturer = ?manufacturer,
            "dropping positions from unsupported manufacturer"
        );
    }

    let mut activity = Activity {
        title,
        description: format!(
            "Recorded on {} {}",
            manufacturer.map_or_else(|| "Unknown".to_string(), display_name),
            device
        ),
        ..Activity::default()
    };
    let mut points = Vec::new();

    for record in fit_file.iter().filter(|r| r.kind() == MesgNum::Record) {
        let Some(timestamp) = record_timestamp(record) else {
            continue;
        };

        // bounds cover every record, including the ones without a position
        activity.start_time.get_or_insert(timestamp);
        activity.end_time = Some(timestamp);

        if !keep_positions {
            continue;
        }
        if let Some(point) = extract_point(record, timestamp) {
            points.push(point);
        }
    }

    Ok((activity, points))
}

fn is_activity_file(file_id: &FitDataRecord) -> bool {
    match field_value(file_id, "type") {
        Some(Value::String(kind)) => kind == "activity",
        Some(Value::Enum(kind)) => *kind == 4,
        _ => false,
    }
}

fn records_positions(manufacturer: &Value) -> bool {
    match manufacturer {
        Value::String(name) => POSITION_MANUFACTURERS.contains(&name.as_str()),
        other => value_to_u16(other).is_some_and(|id| POSITION_MANUFACTURER_IDS.contains(&id)),
    }
}

fn derive_title(fit_file: &[FitDataRecord]) -> String {
    let sports: Vec<String> = fit_file
        .iter()
        .filter(|record| record.kind() == MesgNum::Session)
        .map(session_sport)
        .collect();

    if sports.is_empty() {
        return UNKNOWN_TYPE.to_string();
    }

    title_case(&sports.join(", "))
}

fn session_sport(session: &FitDataRecord) -> String {
    let sport = field_value(session, "sport").map_or_else(String::new, display_name);

    match field_value(session, "sub_sport").map(display_name) {
        Some(sub_sport) if sub_sport != "Generic" => {
            let sub_sport = match sub_sport.as_str() {
                "VirtualActivity" | "IndoorCycling" => "Indoor",
                other => other,
            };
            format!("{sub_sport} {sport}")
        }
        _ => sport,
    }
}

fn derive_device(fit_file: &[FitDataRecord]) -> String {
    let creator = fit_file
        .iter()
        .filter(|record| record.kind() == MesgNum::DeviceInfo)
        .find(|record| field_value(record, "device_index").is_some_and(is_creator_index));

    let Some(creator) = creator else {
        return UNKNOWN_DEVICE.to_string();
    };

    if is_forerunner_745(creator) {
        return FORERUNNER_745_NAME.to_string();
    }

    match field_value(creator, "product_name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => UNKNOWN_DEVICE.to_string(),
    }
}

fn is_creator_index(value: &Value) -> bool {
    match value {
        Value::String(name) => name == "creator",
        other => value_to_u16(other) == Some(0),
    }
}

// fitparser resolves `product` into manufacturer specific subfields such as `garmin_product`.
fn is_forerunner_745(device: &FitDataRecord) -> bool {
    device
        .fields()
        .iter()
        .filter(|field| field.name() == "product" || field.name().ends_with("_product"))
        .any(|field| match field.value() {
            Value::String(name) => name == FORERUNNER_745_KEY,
            other => value_to_u16(other) == Some(FORERUNNER_745_ID),
        })
}

fn extract_point(record: &FitDataRecord, timestamp: DateTime<Utc>) -> Option<Point> {
    let latitude = field_value(record, "position_lat").and_then(semicircles_to_degrees)?;
    let longitude = field_value(record, "position_long").and_then(semicircles_to_degrees)?;

    let mut point = Point::new(timestamp, latitude, longitude);
    if !point.has_fix() {
        return None;
    }

    point.altitude = preferred_f64(record, "enhanced_altitude", "altitude").unwrap_or(0.0);
    point.velocity = preferred_f64(record, "enhanced_speed", "speed").unwrap_or(0.0);

    let accuracy = field_value(record, "gps_accuracy")
        .and_then(value_to_f64)
        .unwrap_or(0.0);
    point.accuracy = accuracy;
    point.vertical_accuracy = accuracy;

    Some(point)
}

fn record_timestamp(record: &FitDataRecord) -> Option<DateTime<Utc>> {
    match field_value(record, "timestamp") {
        Some(Value::Timestamp(ts)) => Some(ts.with_timezone(&Utc)),
        _ => None,
    }
}

fn field_value<'a>(record: &'a FitDataRecord, name: &str) -> Option<&'a Value> {
    record
        .fields()
        .iter()
        .find(|field| field.name() == name)
        .map(|field| field.value())
}

fn preferred_f64(record: &FitDataRecord, preferred: &str, fallback: &str) -> Option<f64> {
    field_value(record, preferred)
        .and_then(value_to_f64)
        .or_else(|| field_value(record, fallback).and_then(value_to_f64))
}

// The decoder drops invalid positions, but the raw sentinel is checked too.
fn semicircles_to_degrees(value: &Value) -> Option<f64> {
    let semicircles = match value {
        Value::SInt32(v) if *v == i32::MAX => return None,
        Value::UInt32(v) if *v == u32::MAX => return None,
        other => value_to_f64(other)?,
    };
    Some(semicircles * SEMICIRCLES_TO_DEGREES)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        Value::SInt8(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::UInt8z(v) => Some(*v as f64),
        Value::Byte(v) => Some(*v as f64),
        Value::Enum(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::UInt16z(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::UInt32z(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt64z(v) => Some(*v as f64),
        _ => None,
    }
}

fn value_to_u16(value: &Value) -> Option<u16> {
    value_to_f64(value)
        .filter(|v| v.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(v))
        .map(|v| v as u16)
}

/// Render a decoded enum value the way FIT tooling prints it:
/// `wahoo_fitness` becomes `WahooFitness`, unknown numeric values stay numeric.
fn display_name(value: &Value) -> String {
    match value {
        Value::String(name) => name
            .split('_')
            .map(capitalize)
            .collect::<Vec<_>>()
            .concat(),
        other => value_to_f64(other).map_or_else(String::new, |v| v.to_string()),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
