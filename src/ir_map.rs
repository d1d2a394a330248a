use std::collections::HashMap;

/// Canonical, format-agnostic map description.
///
/// This is the in-memory structure the builder consumes; the JSON loader is
/// one producer of it, but anything that fills these fields works.
#[derive(Debug)]
pub struct IrMap {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Tile width in pixels, uniform across the whole map.
    pub tile_w: u32,
    /// Tile height in pixels, uniform across the whole map.
    pub tile_h: u32,
    /// Tilesets, sorted by `first_gid`.
    pub tilesets: Vec<IrTileset>,
    /// Layers in draw order, bottom to top.
    pub layers: Vec<IrLayer>,
}

/// One tileset of the map description.
#[derive(Debug)]
pub enum IrTileset {
    /// One image atlas carved into a regular grid.
    Atlas {
        /// First global tile id assigned to this tileset.
        first_gid: u32,
        /// Atlas image path, relative to the map file.
        image: String,
        /// Atlas image width in pixels.
        image_w: u32,
        /// Atlas image height in pixels.
        image_h: u32,
        /// Tile width in pixels.
        tile_w: u32,
        /// Tile height in pixels.
        tile_h: u32,
        /// Pixels between tiles, 0 if not used.
        spacing: u32,
        /// Pixels around the atlas border, 0 if not used.
        margin: u32,
        /// Per-tile metadata overrides, keyed by local tile id.
        tiles: Vec<IrTileMetadata>,
    },
}

/// Extra metadata a tileset attaches to one of its tiles.
#[derive(Debug)]
pub struct IrTileMetadata {
    /// Local tile id within the tileset (0-based; global id is
    /// `first_gid + id`).
    pub id: u32,
    /// Property overrides for that tile.
    pub properties: Properties,
}

/// What kind of content a layer carries.
#[derive(Debug)]
pub enum IrLayerKind {
    /// A grid of raw global tile ids.
    Tiles {
        /// Grid width in tiles.
        width: usize,
        /// Grid height in tiles.
        height: usize,
        /// Raw ids, row-major; may be shorter than `width * height`
        /// (missing cells read as empty).
        data: Vec<u32>,
    },
    /// A layer kind this crate does not render (object groups, image
    /// layers); parsed but skipped by the builder.
    Unsupported,
}

/// One layer of the map description.
#[derive(Debug)]
pub struct IrLayer {
    /// Layer name, may be empty.
    pub name: String,
    /// Hidden layers are skipped entirely at build time.
    pub visible: bool,
    /// The layer's content.
    pub kind: IrLayerKind,
}

/// A single typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean property.
    Bool(bool),
    /// Integer property; kept at full width so large object ids survive.
    I64(i64),
    /// Float property.
    F32(f32),
    /// String property (also used for file/color/class values).
    String(String),
}

/// A string-keyed bag of [`PropertyValue`]s attached to a tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Inserts a property, replacing any previous value under that name.
    pub fn insert(&mut self, name: String, value: PropertyValue) {
        self.0.insert(name, value);
    }

    /// Merges `other` into this bag; `other`'s values win on collision.
    pub fn merge(&mut self, other: Properties) {
        self.0.extend(other.0);
    }

    /// Raw lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// True if the bag holds no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of properties in the bag.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Boolean property by name.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(PropertyValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Integer property by name, if it fits in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        match self.get(name) {
            Some(PropertyValue::I64(v)) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Integer property by name at full width.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(PropertyValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Float property by name.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(PropertyValue::F32(v)) => Some(*v),
            _ => None,
        }
    }

    /// String property by name.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(PropertyValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}
