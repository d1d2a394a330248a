use macroquad::prelude::Rect;

use crate::error::MapError;
use crate::ir_map::{IrTileset, Properties};

/// Raw global tile id. Id 0 is reserved for the empty tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(
    /// The raw id value.
    pub u32,
);

impl TileId {
    /// The reserved empty id.
    pub const EMPTY: TileId = TileId(0);

    /// True for the reserved empty id.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Index into a map's atlas texture list; one per tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasIndex(
    /// Zero-based tileset ordinal.
    pub u16,
);

/// Resolved descriptor of one tile id.
#[derive(Debug, Clone, PartialEq)]
pub enum TileType {
    /// Nothing there. The resolved form of id 0 and of every id no layer set.
    Empty,
    /// A drawable tile.
    Solid {
        /// Which atlas texture the tile lives in.
        atlas: AtlasIndex,
        /// Source rectangle in atlas pixels.
        src: Rect,
        /// Per-tile metadata, possibly empty.
        properties: Properties,
    },
}

static EMPTY_TILE: TileType = TileType::Empty;

impl TileType {
    /// True for the empty variant.
    pub fn is_empty(&self) -> bool {
        matches!(self, TileType::Empty)
    }

    /// The tile's property bag, if it has one.
    pub fn properties(&self) -> Option<&Properties> {
        match self {
            TileType::Solid { properties, .. } => Some(properties),
            TileType::Empty => None,
        }
    }
}

/// Tile id → [`TileType`] table, built once per map from its tilesets.
///
/// Index 0 is pre-seeded with [`TileType::Empty`] before any tileset is
/// consulted; grids store [`TileId`]s and resolve through this table at
/// query/draw time instead of aliasing per-cell tile objects.
#[derive(Debug)]
pub struct TileTable {
    // Indexed by raw id; None marks a gap no tileset covers.
    types: Vec<Option<TileType>>,
}

impl TileTable {
    /// Builds the table by scanning every tileset's atlas geometry.
    ///
    /// Each tileset gets the [`AtlasIndex`] matching its position in the
    /// slice, so the caller can load one texture per tileset in the same
    /// order. When two tilesets claim overlapping id ranges, the later one
    /// wins.
    pub fn from_tilesets(tilesets: &[IrTileset]) -> Result<Self, MapError> {
        let mut table = TileTable {
            types: vec![Some(TileType::Empty)],
        };
        for (i, ts) in tilesets.iter().enumerate() {
            table.register(ts, AtlasIndex(i as u16))?;
        }
        Ok(table)
    }

    /// Total lookup; unknown ids resolve to the empty tile.
    #[inline]
    pub fn resolve(&self, id: TileId) -> &TileType {
        self.types
            .get(id.0 as usize)
            .and_then(|slot| slot.as_ref())
            .unwrap_or(&EMPTY_TILE)
    }

    /// Fallible lookup, used by the builder to validate layer data.
    pub fn get(&self, id: TileId) -> Option<&TileType> {
        self.types.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }

    fn register(&mut self, tileset: &IrTileset, atlas: AtlasIndex) -> Result<(), MapError> {
        let IrTileset::Atlas {
            first_gid,
            image,
            image_w,
            image_h,
            tile_w,
            tile_h,
            spacing,
            margin,
            tiles,
        } = tileset;

        if *first_gid == 0 {
            return Err(MapError::MalformedTileset {
                image: image.clone(),
                reason: "first gid 0 collides with the reserved empty id".into(),
            });
        }

        // Row-major scan from (margin, margin). A column fits only while a
        // full tile-plus-spacing step fits; trailing partial columns/rows are
        // excluded, matching the format's packing convention.
        let step_x = tile_w + spacing;
        let step_y = tile_h + spacing;
        let mut gid = *first_gid;
        let mut y = *margin;
        while y + tile_h + spacing <= *image_h {
            let mut x = *margin;
            while x + tile_w + spacing <= *image_w {
                self.insert(
                    gid,
                    TileType::Solid {
                        atlas,
                        src: Rect::new(x as f32, y as f32, *tile_w as f32, *tile_h as f32),
                        properties: Properties::new(),
                    },
                );
                gid += 1;
                x += step_x;
            }
            y += step_y;
        }

        let tilecount = gid - first_gid;
        if tilecount == 0 {
            return Err(MapError::MalformedTileset {
                image: image.clone(),
                reason: format!(
                    "no tiles fit a {}x{} atlas with tile {}x{}, margin {}, spacing {}",
                    image_w, image_h, tile_w, tile_h, margin, spacing
                ),
            });
        }

        // Second pass: merge per-tile property overrides onto the tiles the
        // scan produced.
        for meta in tiles {
            let target = first_gid + meta.id;
            if meta.id >= tilecount {
                return Err(MapError::MalformedTileset {
                    image: image.clone(),
                    reason: format!(
                        "tile metadata references local id {} but the scan produced {} tiles",
                        meta.id, tilecount
                    ),
                });
            }
            if let Some(Some(TileType::Solid { properties, .. })) =
                self.types.get_mut(target as usize)
            {
                properties.merge(meta.properties.clone());
            }
        }

        Ok(())
    }

    fn insert(&mut self, gid: u32, tile: TileType) {
        let idx = gid as usize;
        if idx >= self.types.len() {
            self.types.resize(idx + 1, None);
        }
        self.types[idx] = Some(tile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir_map::{IrTileMetadata, PropertyValue};

    fn atlas(
        first_gid: u32,
        image_w: u32,
        image_h: u32,
        tile: u32,
        margin: u32,
        spacing: u32,
        tiles: Vec<IrTileMetadata>,
    ) -> IrTileset {
        IrTileset::Atlas {
            first_gid,
            image: "tiles.png".into(),
            image_w,
            image_h,
            tile_w: tile,
            tile_h: tile,
            spacing,
            margin,
            tiles,
        }
    }

    #[test]
    fn scan_excludes_trailing_partial_column() {
        // 130 wide, tile 32, spacing 2: columns at x = 0, 34, 68; x = 102
        // would need 102 + 34 = 136 <= 130 and is excluded.
        let table =
            TileTable::from_tilesets(&[atlas(1, 130, 34, 32, 0, 2, Vec::new())]).expect("scan");

        let mut solid = 0;
        for raw in 1..=4 {
            if !table.resolve(TileId(raw)).is_empty() {
                solid += 1;
            }
        }
        assert_eq!(solid, 3);

        match table.resolve(TileId(3)) {
            TileType::Solid { src, .. } => {
                assert_eq!(src.x, 68.0);
                assert_eq!(src.y, 0.0);
                assert_eq!(src.w, 32.0);
                assert_eq!(src.h, 32.0);
            }
            TileType::Empty => panic!("expected third column tile"),
        }
    }

    #[test]
    fn scan_assigns_ids_row_major_from_first_gid() {
        // 2 columns x 2 rows, 16px tiles, no margin/spacing.
        let table =
            TileTable::from_tilesets(&[atlas(5, 32, 32, 16, 0, 0, Vec::new())]).expect("scan");

        let expect = [(5, 0.0, 0.0), (6, 16.0, 0.0), (7, 0.0, 16.0), (8, 16.0, 16.0)];
        for (gid, x, y) in expect {
            match table.resolve(TileId(gid)) {
                TileType::Solid { src, .. } => {
                    assert_eq!((src.x, src.y), (x, y), "gid {}", gid);
                }
                TileType::Empty => panic!("gid {} missing", gid),
            }
        }
        assert!(table.get(TileId(9)).is_none());
    }

    #[test]
    fn scan_honors_margin() {
        // margin 2: columns at x = 2 and 36; x = 70 would overflow 70px.
        let table =
            TileTable::from_tilesets(&[atlas(1, 72, 36, 32, 2, 2, Vec::new())]).expect("scan");
        match table.resolve(TileId(2)) {
            TileType::Solid { src, .. } => assert_eq!((src.x, src.y), (36.0, 2.0)),
            TileType::Empty => panic!("second column missing"),
        }
        assert!(table.get(TileId(3)).is_none());
    }

    #[test]
    fn zero_tile_scan_is_malformed() {
        let err = TileTable::from_tilesets(&[atlas(1, 16, 16, 32, 0, 0, Vec::new())]).unwrap_err();
        assert!(matches!(err, MapError::MalformedTileset { .. }));
    }

    #[test]
    fn first_gid_zero_is_malformed() {
        let err = TileTable::from_tilesets(&[atlas(0, 64, 64, 32, 0, 0, Vec::new())]).unwrap_err();
        assert!(matches!(err, MapError::MalformedTileset { .. }));
    }

    #[test]
    fn property_overrides_land_on_scanned_tiles() {
        let mut props = Properties::new();
        props.insert("damage".into(), PropertyValue::I64(10));
        let table = TileTable::from_tilesets(&[atlas(
            3,
            64,
            32,
            32,
            0,
            0,
            vec![IrTileMetadata { id: 1, properties: props }],
        )])
        .expect("scan");

        assert_eq!(
            table
                .resolve(TileId(4))
                .properties()
                .and_then(|p| p.get_i32("damage")),
            Some(10)
        );
        assert!(table
            .resolve(TileId(3))
            .properties()
            .map(|p| p.is_empty())
            .unwrap_or(false));
    }

    #[test]
    fn override_outside_scan_range_is_malformed() {
        let mut props = Properties::new();
        props.insert("damage".into(), PropertyValue::I64(10));
        let err = TileTable::from_tilesets(&[atlas(
            1,
            64,
            32,
            32,
            0,
            0,
            vec![IrTileMetadata { id: 7, properties: props }],
        )])
        .unwrap_err();
        assert!(matches!(err, MapError::MalformedTileset { .. }));
    }

    #[test]
    fn id_zero_always_resolves_empty() {
        let table =
            TileTable::from_tilesets(&[atlas(1, 64, 64, 32, 0, 0, Vec::new())]).expect("scan");
        assert!(table.resolve(TileId::EMPTY).is_empty());
        // Out-of-range ids are empty through resolve but absent through get.
        assert!(table.resolve(TileId(999)).is_empty());
        assert!(table.get(TileId(999)).is_none());
    }

    #[test]
    fn later_tileset_wins_overlapping_range() {
        let table = TileTable::from_tilesets(&[
            atlas(1, 64, 32, 32, 0, 0, Vec::new()),
            atlas(2, 32, 32, 32, 0, 0, Vec::new()),
        ])
        .expect("scan");
        match table.resolve(TileId(2)) {
            TileType::Solid { atlas, .. } => assert_eq!(*atlas, AtlasIndex(1)),
            TileType::Empty => panic!("gid 2 missing"),
        }
    }
}
