use std::fs;
use std::path::{Path, PathBuf};

use crate::regions::{RegionDataset, RegionParseError};

#[derive(Debug)]
pub enum DatasetError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: RegionParseError,
    },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io { path, source } => {
                write!(f, "failed to read region dataset {}: {source}", path.display())
            }
            DatasetError::Parse { path, source } => {
                write!(f, "failed to parse region dataset {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io { source, .. } => Some(source),
            DatasetError::Parse { source, .. } => Some(source),
        }
    }
}

/// One-time static load of a region FeatureCollection from disk.
pub fn load_regions(path: impl AsRef<Path>) -> Result<RegionDataset, DatasetError> {
    let path = path.as_ref();
    let payload = fs::read_to_string(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let dataset =
        RegionDataset::from_geojson_str(&payload).map_err(|e| DatasetError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    tracing::info!(
        path = %path.display(),
        regions = dataset.len(),
        digest = dataset.short_digest(),
        "loaded region dataset"
    );
    Ok(dataset)
}
