//! MBTiles archive access.
//!
//! An MBTiles file is a SQLite database with two tables:
//!
//! ```text
//! tiles(zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB)
//! metadata(name TEXT, value TEXT)
//! ```
//!
//! Rows in `tiles` are numbered in TMS order (row 0 at the bottom), while
//! clients address tiles in XYZ order (row 0 at the top). The two are related
//! by `tile_row = 2^z - 1 - y`.
//!
//! Each call opens its own read-only connection and drops it before
//! returning, so concurrent requests never share a handle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use super::kind::is_gzip;
use crate::error::ArchiveError;

/// Metadata keys whose numeric string values are coerced to integers.
const ZOOM_LIMIT_KEYS: [&str; 2] = ["minzoom", "maxzoom"];

// =============================================================================
// Coordinates
// =============================================================================

/// A tile address in XYZ (north-up) convention, as received from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoordinate {
    /// Zoom level
    pub z: i64,

    /// Column, counted from the west edge
    pub x: i64,

    /// Row, counted from the north edge
    pub y: i64,
}

impl TileCoordinate {
    /// Create a new tile coordinate.
    pub fn new(z: i64, x: i64, y: i64) -> Self {
        Self { z, x, y }
    }

    /// Storage row for this coordinate in TMS convention.
    ///
    /// Returns `None` when no stored row can match: negative zoom, or a zoom
    /// too large for `2^z` to fit in 64 bits.
    pub fn tms_row(&self) -> Option<i64> {
        tms_row(self.z, self.y)
    }
}

/// Convert an XYZ row to a TMS row: `2^z - 1 - y`.
pub fn tms_row(z: i64, y: i64) -> Option<i64> {
    if !(0..63).contains(&z) {
        return None;
    }
    let rows = 1i64 << z;
    (rows - 1).checked_sub(y)
}

// =============================================================================
// Metadata
// =============================================================================

/// A value from the `metadata` table after type normalization.
///
/// Stored values are always text. A value that parses as JSON is kept as the
/// parsed structure, anything else stays a plain string, and the zoom-limit
/// keys are then coerced to integers when they hold numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Integer coerced from a numeric-looking string
    Integer(i64),

    /// Parsed JSON value
    Json(serde_json::Value),

    /// Text that is not valid JSON
    Raw(String),
}

impl MetadataValue {
    /// Classify a stored text value: parsed JSON when possible, raw text otherwise.
    pub fn from_stored(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => MetadataValue::Json(value),
            Err(_) => MetadataValue::Raw(text.to_string()),
        }
    }

    /// The string content, if this value is a string of either origin.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Raw(s) => Some(s),
            MetadataValue::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// Normalized archive metadata, serialized as a JSON object.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Build normalized metadata from raw `(name, value)` rows.
///
/// The JSON-promotion pass runs over every row first; the integer coercion of
/// the zoom-limit keys runs afterwards on whatever was stored. Later rows with
/// a duplicate name replace earlier ones.
pub fn normalize_metadata<I>(rows: I) -> Metadata
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut metadata: Metadata = rows
        .into_iter()
        .map(|(name, value)| {
            let value = MetadataValue::from_stored(&value);
            (name, value)
        })
        .collect();

    for key in ZOOM_LIMIT_KEYS {
        let coerced = metadata
            .get(key)
            .and_then(MetadataValue::as_str)
            .and_then(|s| s.parse::<i64>().ok());
        if let Some(n) = coerced {
            metadata.insert(key.to_string(), MetadataValue::Integer(n));
        }
    }

    metadata
}

// =============================================================================
// Archive
// =============================================================================

/// Tile bytes read from an archive.
#[derive(Debug, Clone)]
pub struct TileData {
    /// The stored blob, unmodified
    pub data: Bytes,

    /// Whether the blob starts with the gzip magic number
    pub gzip: bool,
}

/// Read-only access to one MBTiles file.
#[derive(Debug, Clone)]
pub struct MbTilesArchive {
    path: PathBuf,
}

impl MbTilesArchive {
    /// Create a handle description for the archive at `path`.
    ///
    /// Nothing is opened until a read is performed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch a tile on the blocking thread pool.
    pub async fn get_tile(&self, coord: TileCoordinate) -> Result<TileData, ArchiveError> {
        let archive = self.clone();
        tokio::task::spawn_blocking(move || archive.read_tile(coord))
            .await
            .map_err(|e| ArchiveError::Worker(e.to_string()))?
    }

    /// Fetch normalized metadata on the blocking thread pool.
    pub async fn get_metadata(&self) -> Result<Metadata, ArchiveError> {
        let archive = self.clone();
        tokio::task::spawn_blocking(move || archive.read_metadata())
            .await
            .map_err(|e| ArchiveError::Worker(e.to_string()))?
    }

    /// Read a single tile, blocking the current thread.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::TileNotFound`] when no row matches
    /// - [`ArchiveError::Open`] / [`ArchiveError::Query`] for backend failures
    pub fn read_tile(&self, coord: TileCoordinate) -> Result<TileData, ArchiveError> {
        let not_found = ArchiveError::TileNotFound {
            z: coord.z,
            x: coord.x,
            y: coord.y,
        };
        let Some(row) = coord.tms_row() else {
            return Err(not_found);
        };

        let conn = self.open()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                params![coord.z, coord.x, row],
                |r| Ok(value_as_bytes(r.get_ref(0)?)),
            )
            .optional()
            .map_err(|e| self.query_error(e))?;

        let Some(data) = blob else {
            return Err(not_found);
        };

        debug!(
            archive = %self.path.display(),
            z = coord.z,
            x = coord.x,
            y = coord.y,
            tile_row = row,
            bytes = data.len(),
            "Read tile"
        );

        let gzip = is_gzip(&data);
        Ok(TileData {
            data: Bytes::from(data),
            gzip,
        })
    }

    /// Read and normalize the `metadata` table, blocking the current thread.
    pub fn read_metadata(&self) -> Result<Metadata, ArchiveError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT name, value FROM metadata")
            .map_err(|e| self.query_error(e))?;
        let mut rows = stmt.query([]).map_err(|e| self.query_error(e))?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().map_err(|e| self.query_error(e))? {
            let name = row.get_ref(0).map_err(|e| self.query_error(e))?;
            let value = row.get_ref(1).map_err(|e| self.query_error(e))?;
            match (value_as_text(name), value_as_text(value)) {
                (Some(name), Some(value)) => entries.push((name, value)),
                _ => debug!(archive = %self.path.display(), "Skipping NULL metadata row"),
            }
        }

        Ok(normalize_metadata(entries))
    }

    fn open(&self) -> Result<Connection, ArchiveError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags).map_err(|e| ArchiveError::Open {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn query_error(&self, e: rusqlite::Error) -> ArchiveError {
        ArchiveError::Query {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

/// Raw bytes of a stored tile, whatever its storage class.
///
/// SQLite column affinity lets `tile_data` hold TEXT or numbers as well as
/// BLOBs. NULL is an empty tile.
fn value_as_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Null => Vec::new(),
        ValueRef::Integer(i) => i.to_string().into_bytes(),
        ValueRef::Real(f) => f.to_string().into_bytes(),
        ValueRef::Text(b) | ValueRef::Blob(b) => b.to_vec(),
    }
}

/// Render any non-NULL SQLite value as text.
fn value_as_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}
