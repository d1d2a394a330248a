use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for map decoding and map building.
#[derive(Debug)]
pub enum MapError {
    /// File I/O error, with the path that failed.
    Io {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// JSON parse error, with the path that failed.
    Json {
        /// Path of the file that could not be parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// The map description violates a structural rule (wrong extension,
    /// non-JSON external tileset reference, ...).
    InvalidMap(String),
    /// A property declared a type this crate does not understand.
    UnsupportedPropertyType {
        /// Name of the offending property.
        name: String,
        /// The declared type string.
        kind: String,
    },
    /// A tileset's geometry or metadata is unusable.
    MalformedTileset {
        /// The tileset's atlas image path, for identification.
        image: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A layer references a tile id no tileset covers.
    UnknownTileId {
        /// Name of the layer holding the bad reference.
        layer: String,
        /// The unresolvable id.
        id: u32,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "JSON parse error in {}: {}", path.display(), source)
            }
            MapError::InvalidMap(msg) => write!(f, "Invalid map: {}", msg),
            MapError::UnsupportedPropertyType { name, kind } => {
                write!(f, "Property '{}' has unsupported type '{}'", name, kind)
            }
            MapError::MalformedTileset { image, reason } => {
                write!(f, "Malformed tileset '{}': {}", image, reason)
            }
            MapError::UnknownTileId { layer, id } => {
                write!(f, "Layer '{}' references unknown tile id {}", layer, id)
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
