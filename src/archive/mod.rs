//! Tile archive formats.
//!
//! Two archive formats are served:
//!
//! - **MBTiles** ([`MbTilesArchive`]): SQLite containers queried per tile and
//!   for their metadata table
//! - **PMTiles**: single-file archives passed through as raw bytes; clients
//!   read them with HTTP range requests, so the server never parses them

mod kind;
mod mbtiles;

pub use kind::{is_gzip, ArchiveKind, MBTILES_EXTENSION, PMTILES_EXTENSION, TILE_CONTENT_TYPE};
pub use mbtiles::{
    normalize_metadata, tms_row, MbTilesArchive, Metadata, MetadataValue, TileCoordinate, TileData,
};
