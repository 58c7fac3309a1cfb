use activity_import::{
    Activity, ActivityError, ActivityFormat, Point, parse_activity, parse_activity_bytes,
};
use flate2::read::GzDecoder;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

pub const DATA_DIR: &str = "data";
pub const OUT_PATH: &str = "data/activities.json";

const EXTENSIONS: [&str; 6] = [".fit", ".gpx", ".tcx", ".fit.gz", ".gpx.gz", ".tcx.gz"];

#[derive(Serialize)]
struct ImportedActivity {
    source: PathBuf,
    activity: Activity,
    points: Vec<Point>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "activity_import=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = Path::new(DATA_DIR);
    let files = find_activity_files(data_dir);
    tracing::info!(count = files.len(), dir = %data_dir.display(), "found activity files");

    if files.is_empty() {
        return Ok(());
    }

    // each file is parsed independently, so a failure only skips that file
    let results: Vec<(PathBuf, Result<(Activity, Vec<Point>), ActivityError>)> = files
        .into_par_iter()
        .progress()
        .map(|path| {
            let result = import_file(&path);
            (path, result)
        })
        .collect();

    let mut imported = Vec::new();
    let mut failed = 0;
    for (source, result) in results {
        match result {
            Ok((activity, points)) => imported.push(ImportedActivity {
                source,
                activity,
                points,
            }),
            Err(e) => {
                failed += 1;
                tracing::warn!(path = %source.display(), error = %e, "skipping file");
            }
        }
    }

    let total_points: usize = imported.iter().map(|a| a.points.len()).sum();

    if let Some(parent) = Path::new(OUT_PATH).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(OUT_PATH, serde_json::to_vec_pretty(&imported)?)?;

    tracing::info!(
        imported = imported.len(),
        failed,
        points = total_points,
        out = OUT_PATH,
        "import finished"
    );

    Ok(())
}

/// Recursively collect supported exports, sorted by path.
fn find_activity_files(data_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(data_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| {
            if !entry.file_type().is_file() {
                return false;
            }

            let file_name = entry
                .path()
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("");

            EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/**
 * Parse a plain export, or inflate a `.gz` one (Strava bulk exports) and
 * dispatch on the extension underneath.
 */
fn import_file(path: &Path) -> Result<(Activity, Vec<Point>), ActivityError> {
    if path.extension().is_none_or(|ext| ext != "gz") {
        return parse_activity(path);
    }

    let format = ActivityFormat::from_path(&path.with_extension(""))?;

    let read_error = |source| ActivityError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_error)?;
    let mut decompressed_data = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut decompressed_data)
        .map_err(read_error)?;

    parse_activity_bytes(format, &decompressed_data)
}
