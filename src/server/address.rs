//! Tile address parsing.
//!
//! Decomposes the part of a URL that follows the `map/` namespace into an
//! archive identifier plus what is being asked of it:
//!
//! ```text
//! {archive}/metadata.json     -> archive metadata
//! {archive}.mbtiles/{z}/{x}/{y} -> a single tile
//! {archive}.mbtiles           -> the whole archive
//! {archive}.pmtiles           -> the whole archive
//! ```
//!
//! Coordinate parsing is attempted before whole-archive handling, so a path
//! like `a.mbtiles/1/2/3` is always a tile request.

use crate::archive::{ArchiveKind, TileCoordinate};

/// Suffix that selects the metadata document of an archive.
const METADATA_SUFFIX: &str = "/metadata.json";

/// A request under the `map/` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapRequest {
    /// `{archive}/metadata.json`
    Metadata { archive: String },

    /// `{archive}/{z}/{x}/{y}` on an MBTiles archive
    Tile {
        archive: String,
        coord: TileCoordinate,
    },

    /// A whole archive, served raw or through the viewer
    Archive { archive: String, kind: ArchiveKind },
}

impl MapRequest {
    /// The archive identifier, relative to the server root.
    pub fn archive(&self) -> &str {
        match self {
            MapRequest::Metadata { archive }
            | MapRequest::Tile { archive, .. }
            | MapRequest::Archive { archive, .. } => archive,
        }
    }
}

/// Parse the path remainder after `map/`.
///
/// Returns `None` for anything that is not a recognized request.
pub fn parse_map_path(path: &str) -> Option<MapRequest> {
    if let Some(archive) = path.strip_suffix(METADATA_SUFFIX) {
        if archive.is_empty() {
            return None;
        }
        return Some(MapRequest::Metadata {
            archive: archive.to_string(),
        });
    }

    if let Some((archive, coord)) = split_coordinates(path) {
        if ArchiveKind::from_path(archive) == Some(ArchiveKind::MbTiles) {
            return Some(MapRequest::Tile {
                archive: archive.to_string(),
                coord,
            });
        }
    }

    ArchiveKind::from_path(path).map(|kind| MapRequest::Archive {
        archive: path.to_string(),
        kind,
    })
}

/// Split `{prefix}/{z}/{x}/{y}` into the prefix and the coordinate triple.
fn split_coordinates(path: &str) -> Option<(&str, TileCoordinate)> {
    let mut parts = path.rsplitn(4, '/');
    let y = parts.next()?.parse::<i64>().ok()?;
    let x = parts.next()?.parse::<i64>().ok()?;
    let z = parts.next()?.parse::<i64>().ok()?;
    let archive = parts.next()?;
    Some((archive, TileCoordinate::new(z, x, y)))
}
