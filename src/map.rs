use anyhow::Context;
use macroquad::prelude::{load_texture, FilterMode, Rect, Texture2D};
use std::path::Path;

use crate::error::MapError;
use crate::ir_map::{IrLayerKind, IrMap, IrTileset, Properties};
use crate::loader::json_loader::decode_map_file_to_ir;
use crate::render::{draw_tile_layers, BlitSink, ScreenSink};
use crate::tileset::{TileId, TileTable, TileType};

/// One resolved layer: a map-sized, row-major grid of tile ids.
///
/// Cells hold raw ids and resolve through the map's [`TileTable`]; id 0 is
/// the empty tile.
#[derive(Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<TileId>,
}

impl TileGrid {
    fn empty(width: u32, height: u32) -> Self {
        TileGrid {
            width,
            height,
            cells: vec![TileId::EMPTY; (width as usize) * (height as usize)],
        }
    }

    /// Id at `(x, y)`; out-of-range coordinates read as empty.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> TileId {
        if x >= self.width || y >= self.height {
            return TileId::EMPTY;
        }
        self.cells[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: u32, y: u32, id: TileId) {
        self.cells[(y * self.width + x) as usize] = id;
    }

    /// Grid width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A fully built tile map: resolved layers, the combined gameplay grid, the
/// tile-type table and one atlas texture per tileset.
///
/// Built once from an [`IrMap`]; immutable afterwards. Rendering only reads.
#[derive(Debug)]
pub struct Map {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    table: TileTable,
    layers: Vec<TileGrid>,
    combined: TileGrid,
    atlases: Vec<Texture2D>,
    no_props: Properties,
}

impl Map {
    /// Loads a JSON map file, then builds the map (one texture per tileset).
    pub async fn load(path: &str) -> anyhow::Result<Self> {
        let (ir, base) = decode_map_file_to_ir(path)?;
        Self::from_ir(ir, &base).await
    }

    /// Builds a map from an already-decoded description, loading one atlas
    /// texture per tileset from `base_dir`.
    pub async fn from_ir(ir: IrMap, base_dir: &Path) -> anyhow::Result<Self> {
        let mut atlases = Vec::with_capacity(ir.tilesets.len());
        for ts in &ir.tilesets {
            let IrTileset::Atlas { image, .. } = ts;
            let img_path = base_dir.join(image);
            let tex = load_texture(&img_path.to_string_lossy())
                .await
                .with_context(|| format!("Loading texture {}", image))?;
            tex.set_filter(FilterMode::Nearest);
            atlases.push(tex);
        }
        Ok(Self::from_ir_with_textures(&ir, atlases)?)
    }

    /// Builds a map without touching the GPU; `textures` must be index-aligned
    /// with `ir.tilesets` for on-screen drawing (an empty list is fine for
    /// headless use with a custom sink).
    pub fn from_ir_with_textures(
        ir: &IrMap,
        textures: Vec<Texture2D>,
    ) -> Result<Self, MapError> {
        let table = TileTable::from_tilesets(&ir.tilesets)?;
        let (layers, combined) = resolve_layers(ir, &table)?;

        Ok(Map {
            width: ir.width,
            height: ir.height,
            tile_w: ir.tile_w,
            tile_h: ir.tile_h,
            table,
            layers,
            combined,
            atlases: textures,
            no_props: Properties::new(),
        })
    }

    /// The effective tile occupying cell `(x, y)`: the topmost non-empty
    /// layer's tile there, or [`TileType::Empty`]. Out-of-range cells read
    /// as empty.
    pub fn tile_at(&self, x: u32, y: u32) -> &TileType {
        self.table.resolve(self.combined.get(x, y))
    }

    /// The property bag of the effective tile at `(x, y)`; empty for empty
    /// cells.
    pub fn properties_at(&self, x: u32, y: u32) -> &Properties {
        match self.tile_at(x, y) {
            TileType::Solid { properties, .. } => properties,
            TileType::Empty => &self.no_props,
        }
    }

    /// Resolved layer grids, bottom to top.
    pub fn layers(&self) -> &[TileGrid] {
        &self.layers
    }

    /// The combined gameplay grid (topmost non-empty tile per cell).
    pub fn combined(&self) -> &TileGrid {
        &self.combined
    }

    /// The map's tile-type table.
    pub fn table(&self) -> &TileTable {
        &self.table
    }

    /// Draws the part of the map visible inside `viewport` (pixel space)
    /// to the screen. Viewport origins must be non-negative.
    pub fn draw(&self, viewport: Rect) {
        let mut sink = ScreenSink::new(&self.atlases);
        self.draw_into(&mut sink, viewport);
    }

    /// Same as [`Map::draw`] but issuing blits into an arbitrary sink.
    pub fn draw_into<S: BlitSink>(&self, sink: &mut S, viewport: Rect) {
        draw_tile_layers(
            sink,
            &self.table,
            &self.layers,
            self.tile_w,
            self.tile_h,
            self.width,
            self.height,
            viewport,
        );
    }
}

// Resolves every visible tile layer to a map-sized grid and folds the
// combined grid: later layers overwrite earlier ones wherever non-empty.
fn resolve_layers(
    ir: &IrMap,
    table: &TileTable,
) -> Result<(Vec<TileGrid>, TileGrid), MapError> {
    let mut layers = Vec::new();
    let mut combined = TileGrid::empty(ir.width, ir.height);

    for layer in &ir.layers {
        if !layer.visible {
            continue;
        }
        let IrLayerKind::Tiles { width, height, data } = &layer.kind else {
            continue;
        };

        let mut grid = TileGrid::empty(ir.width, ir.height);
        for y in 0..ir.height {
            for x in 0..ir.width {
                if x as usize >= *width || y as usize >= *height {
                    continue;
                }
                let idx = (y as usize) * width + (x as usize);
                // Short data is legal: absent cells stay empty.
                let raw = match data.get(idx) {
                    Some(raw) => *raw,
                    None => continue,
                };
                if raw == 0 {
                    continue;
                }
                let id = TileId(raw);
                if table.get(id).is_none() {
                    return Err(MapError::UnknownTileId {
                        layer: layer.name.clone(),
                        id: raw,
                    });
                }
                grid.set(x, y, id);
                combined.set(x, y, id);
            }
        }
        layers.push(grid);
    }

    Ok((layers, combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir_map::{IrLayer, IrTileMetadata, PropertyValue};

    fn tileset(first_gid: u32) -> IrTileset {
        // 4 columns x 1 row of 16px tiles.
        IrTileset::Atlas {
            first_gid,
            image: "tiles.png".into(),
            image_w: 64,
            image_h: 16,
            tile_w: 16,
            tile_h: 16,
            spacing: 0,
            margin: 0,
            tiles: Vec::new(),
        }
    }

    fn tile_layer(name: &str, width: usize, height: usize, data: Vec<u32>) -> IrLayer {
        IrLayer {
            name: name.into(),
            visible: true,
            kind: IrLayerKind::Tiles { width, height, data },
        }
    }

    fn ir(layers: Vec<IrLayer>) -> IrMap {
        IrMap {
            width: 4,
            height: 4,
            tile_w: 16,
            tile_h: 16,
            tilesets: vec![tileset(1)],
            layers,
        }
    }

    #[test]
    fn unset_cells_resolve_empty() {
        let map = Map::from_ir_with_textures(
            &ir(vec![tile_layer("ground", 4, 4, vec![0; 16])]),
            Vec::new(),
        )
        .expect("build");

        for y in 0..4 {
            for x in 0..4 {
                assert!(map.tile_at(x, y).is_empty());
                assert!(map.properties_at(x, y).is_empty());
            }
        }
    }

    #[test]
    fn combined_grid_takes_topmost_non_empty() {
        // Layer 0 sets tile 1 at (2, 3); layer 1 is empty there.
        let mut bottom = vec![0u32; 16];
        bottom[3 * 4 + 2] = 1;
        let ir_map = ir(vec![
            tile_layer("bottom", 4, 4, bottom.clone()),
            tile_layer("top", 4, 4, vec![0; 16]),
        ]);
        let map = Map::from_ir_with_textures(&ir_map, Vec::new()).expect("build");
        assert_eq!(map.combined().get(2, 3), TileId(1));

        // Now layer 1 sets tile 2 at (2, 3): the top layer wins.
        let mut top = vec![0u32; 16];
        top[3 * 4 + 2] = 2;
        let ir_map = ir(vec![
            tile_layer("bottom", 4, 4, bottom),
            tile_layer("top", 4, 4, top),
        ]);
        let map = Map::from_ir_with_textures(&ir_map, Vec::new()).expect("build");
        assert_eq!(map.combined().get(2, 3), TileId(2));
        assert!(!map.tile_at(2, 3).is_empty());
    }

    #[test]
    fn unknown_id_aborts_build() {
        let err = Map::from_ir_with_textures(
            &ir(vec![tile_layer("bad", 4, 4, vec![99, 0, 0, 0])]),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::UnknownTileId { ref layer, id: 99 } if layer == "bad"
        ));
    }

    #[test]
    fn short_layer_data_reads_empty() {
        // Only the first two cells are present.
        let map = Map::from_ir_with_textures(
            &ir(vec![tile_layer("sparse", 4, 4, vec![1, 2])]),
            Vec::new(),
        )
        .expect("build");
        assert_eq!(map.combined().get(0, 0), TileId(1));
        assert_eq!(map.combined().get(1, 0), TileId(2));
        assert!(map.tile_at(2, 0).is_empty());
        assert!(map.tile_at(3, 3).is_empty());
    }

    #[test]
    fn undersized_layer_grid_reads_empty_outside() {
        // A 2x2 layer inside a 4x4 map.
        let map = Map::from_ir_with_textures(
            &ir(vec![tile_layer("small", 2, 2, vec![1, 1, 1, 1])]),
            Vec::new(),
        )
        .expect("build");
        assert_eq!(map.combined().get(1, 1), TileId(1));
        assert!(map.tile_at(2, 2).is_empty());
    }

    #[test]
    fn invisible_layers_are_skipped() {
        let mut hidden = tile_layer("hidden", 4, 4, vec![1; 16]);
        hidden.visible = false;
        let map = Map::from_ir_with_textures(&ir(vec![hidden]), Vec::new()).expect("build");
        assert!(map.layers().is_empty());
        assert!(map.tile_at(0, 0).is_empty());
    }

    #[test]
    fn out_of_range_queries_read_empty() {
        let map = Map::from_ir_with_textures(
            &ir(vec![tile_layer("ground", 4, 4, vec![1; 16])]),
            Vec::new(),
        )
        .expect("build");
        assert!(!map.tile_at(3, 3).is_empty());
        assert!(map.tile_at(4, 0).is_empty());
        assert!(map.tile_at(0, 100).is_empty());
    }

    #[test]
    fn properties_reach_gameplay_queries() {
        let mut props = Properties::new();
        props.insert("solid".into(), PropertyValue::Bool(true));
        let ts = IrTileset::Atlas {
            first_gid: 1,
            image: "tiles.png".into(),
            image_w: 64,
            image_h: 16,
            tile_w: 16,
            tile_h: 16,
            spacing: 0,
            margin: 0,
            tiles: vec![IrTileMetadata { id: 0, properties: props }],
        };
        let ir_map = IrMap {
            width: 2,
            height: 1,
            tile_w: 16,
            tile_h: 16,
            tilesets: vec![ts],
            layers: vec![tile_layer("ground", 2, 1, vec![1, 2])],
        };
        let map = Map::from_ir_with_textures(&ir_map, Vec::new()).expect("build");
        assert_eq!(map.properties_at(0, 0).get_bool("solid"), Some(true));
        assert_eq!(map.properties_at(1, 0).get_bool("solid"), None);
    }
}
