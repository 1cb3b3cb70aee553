//! Archive classification and tile blob sniffing.

/// File extension of SQLite-backed MBTiles archives.
pub const MBTILES_EXTENSION: &str = ".mbtiles";

/// File extension of packed single-file PMTiles archives.
pub const PMTILES_EXTENSION: &str = ".pmtiles";

/// MIME type declared for every tile served from an MBTiles archive.
pub const TILE_CONTENT_TYPE: &str = "application/x-protobuf";

/// Gzip member header magic.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Kind of tile archive, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// SQLite container with `tiles` and `metadata` tables
    MbTiles,

    /// Single-file archive read by clients through byte ranges
    PmTiles,
}

impl ArchiveKind {
    /// Classify an archive identifier by its extension.
    ///
    /// Matching is literal and case-sensitive.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(MBTILES_EXTENSION) {
            Some(ArchiveKind::MbTiles)
        } else if path.ends_with(PMTILES_EXTENSION) {
            Some(ArchiveKind::PmTiles)
        } else {
            None
        }
    }

    /// Human-readable name of the format.
    pub const fn name(&self) -> &'static str {
        match self {
            ArchiveKind::MbTiles => "MBTiles",
            ArchiveKind::PmTiles => "PMTiles",
        }
    }
}

/// Whether a tile blob is gzip-compressed and needs `Content-Encoding: gzip`.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}
