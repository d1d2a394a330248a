#![warn(missing_docs)]

//! Layered tilemap resolver & viewport renderer for Macroquad.
//!
//! Loading happens once: a map description (Tiled-style JSON or any producer
//! of [`IrMap`]) is resolved into per-layer tile grids, a combined gameplay
//! grid and one atlas texture per tileset. Per frame, [`Map::draw`] blits
//! only the tiles visible inside a pixel-space viewport, with sub-tile
//! offsets for smooth scrolling.

mod error;
mod ir_map;
mod loader {
    pub mod json_loader;
}
mod map;
mod render;
mod tileset;

pub use error::MapError;
pub use ir_map::{
    IrLayer, IrLayerKind, IrMap, IrTileMetadata, IrTileset, Properties, PropertyValue,
};
pub use loader::json_loader::decode_map_file_to_ir;
pub use map::{Map, TileGrid};
pub use render::{
    draw_tile_layers, visible_region, BlitSink, CommandSink, DrawCommand, ScreenSink, TileRegion,
};
pub use tileset::{AtlasIndex, TileId, TileTable, TileType};
