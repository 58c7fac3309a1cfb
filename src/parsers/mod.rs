pub mod fit;
pub mod gpx;
pub mod tcx;

use crate::error::ActivityError;
use crate::types::{Activity, Point};
use std::fmt;
use std::path::Path;

/// Container formats understood by the importer, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityFormat {
    Fit,
    Gpx,
    Tcx,
}

impl ActivityFormat {
    /// Match an extension exactly (`fit`, `gpx`, `tcx`).
    pub fn from_extension(extension: &str) -> Result<Self, ActivityError> {
        match extension {
            "fit" => Ok(ActivityFormat::Fit),
            "gpx" => Ok(ActivityFormat::Gpx),
            "tcx" => Ok(ActivityFormat::Tcx),
            other => Err(ActivityError::UnknownFormat(other.to_string())),
        }
    }

    /// Detect the format from whatever follows the last `.` of the path.
    /// File content is never sniffed.
    pub fn from_path(path: &Path) -> Result<Self, ActivityError> {
        let path = path.to_string_lossy();
        let extension = path.rsplit('.').next().unwrap_or_default();
        Self::from_extension(extension)
    }
}

impl fmt::Display for ActivityFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityFormat::Fit => "fit",
            ActivityFormat::Gpx => "gpx",
            ActivityFormat::Tcx => "tcx",
        };
        f.write_str(name)
    }
}

/// Read a FIT, GPX or TCX export and normalize it into an [`Activity`] and its points.
pub fn parse_activity(path: impl AsRef<Path>) -> Result<(Activity, Vec<Point>), ActivityError> {
    let path = path.as_ref();
    let format = ActivityFormat::from_path(path)?;

    let raw_data = std::fs::read(path).map_err(|source| ActivityError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_activity_bytes(format, &raw_data)
}

/// Normalize an export that is already in memory.
pub fn parse_activity_bytes(
    format: ActivityFormat,
    raw_data: &[u8],
) -> Result<(Activity, Vec<Point>), ActivityError> {
    let (activity, points) = match format {
        ActivityFormat::Fit => fit::parse_fit(raw_data)?,
        ActivityFormat::Gpx => gpx::parse_gpx(raw_data)?,
        ActivityFormat::Tcx => tcx::parse_tcx(raw_data)?,
    };

    tracing::debug!(
        %format,
        title = %activity.title,
        points = points.len(),
        "normalized activity"
    );

    Ok((activity, points))
}
