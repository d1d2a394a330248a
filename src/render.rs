use macroquad::prelude::{draw_texture_ex, vec2, DrawTextureParams, Rect, Texture2D, Vec2, WHITE};

use crate::map::TileGrid;
use crate::tileset::{AtlasIndex, TileTable, TileType};

/// The visible tile-index window of a pixel viewport, plus the sub-tile
/// scroll remainder.
///
/// Index ranges are half-open: `i` in `[i_start, i_end)`, `j` in
/// `[j_start, j_end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRegion {
    /// First visible column.
    pub i_start: u32,
    /// One past the last visible column, clamped to the map width.
    pub i_end: u32,
    /// First visible row.
    pub j_start: u32,
    /// One past the last visible row, clamped to the map height.
    pub j_end: u32,
    /// Horizontal sub-tile remainder: `viewport.x mod tile_w`.
    pub x_offset: f32,
    /// Vertical sub-tile remainder: `viewport.y mod tile_h`.
    pub y_offset: f32,
}

/// Computes the tile-index range covered by a pixel-space viewport.
///
/// The extra trailing index keeps a partially visible tile on screen when the
/// viewport size is not a tile multiple; end indices are clamped to the map
/// dimensions. Start indices are not clamped: viewport origins must be
/// non-negative.
pub fn visible_region(
    viewport: Rect,
    tile_w: u32,
    tile_h: u32,
    map_w: u32,
    map_h: u32,
) -> TileRegion {
    let tw = tile_w as f32;
    let th = tile_h as f32;

    let i_start = (viewport.x / tw).floor() as u32;
    let j_start = (viewport.y / th).floor() as u32;
    let i_end = (i_start + (viewport.w / tw).floor() as u32 + 1).min(map_w);
    let j_end = (j_start + (viewport.h / th).floor() as u32 + 1).min(map_h);

    TileRegion {
        i_start,
        i_end,
        j_start,
        j_end,
        x_offset: viewport.x % tw,
        y_offset: viewport.y % th,
    }
}

/// Receiver of tile blits; the seam between the renderer and the backend.
///
/// Every call is an unmodified blit: full opacity, no tint beyond opaque
/// white, zero rotation, unit scale.
pub trait BlitSink {
    /// Draw the `src` rectangle of atlas `atlas` at viewport-local `dest`.
    fn blit(&mut self, atlas: AtlasIndex, dest: Vec2, src: Rect);
}

/// Sink that draws straight to the screen through macroquad.
pub struct ScreenSink<'a> {
    atlases: &'a [Texture2D],
}

impl<'a> ScreenSink<'a> {
    /// `atlases` must be index-aligned with the map's [`AtlasIndex`]es.
    pub fn new(atlases: &'a [Texture2D]) -> Self {
        ScreenSink { atlases }
    }
}

impl BlitSink for ScreenSink<'_> {
    fn blit(&mut self, atlas: AtlasIndex, dest: Vec2, src: Rect) {
        draw_texture_ex(
            &self.atlases[atlas.0 as usize],
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                source: Some(src),
                ..Default::default()
            },
        );
    }
}

/// One recorded blit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Atlas the tile was sourced from.
    pub atlas: AtlasIndex,
    /// Viewport-local destination position in pixels.
    pub dest: Vec2,
    /// Source rectangle in atlas pixels.
    pub src: Rect,
}

/// Sink that records blits in call order instead of drawing them.
#[derive(Default)]
pub struct CommandSink {
    /// Recorded commands, in issue order.
    pub commands: Vec<DrawCommand>,
}

impl CommandSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlitSink for CommandSink {
    fn blit(&mut self, atlas: AtlasIndex, dest: Vec2, src: Rect) {
        self.commands.push(DrawCommand { atlas, dest, src });
    }
}

/// Draws every non-empty tile of `layers` visible inside `viewport`.
///
/// Layers iterate bottom to top in the outer loop so later layers paint over
/// earlier ones; within a layer, columns then rows. The destination position
/// shifts the whole grid left/up by the sub-tile remainder, which is what
/// makes pixel-granular scrolling smooth.
#[allow(clippy::too_many_arguments)]
pub fn draw_tile_layers<S: BlitSink>(
    sink: &mut S,
    table: &TileTable,
    layers: &[TileGrid],
    tile_w: u32,
    tile_h: u32,
    map_w: u32,
    map_h: u32,
    viewport: Rect,
) {
    let region = visible_region(viewport, tile_w, tile_h, map_w, map_h);
    let tw = tile_w as f32;
    let th = tile_h as f32;

    for grid in layers {
        for i in region.i_start..region.i_end {
            for j in region.j_start..region.j_end {
                let tile = table.resolve(grid.get(i, j));
                if let TileType::Solid { atlas, src, .. } = tile {
                    let dest = vec2(
                        (i - region.i_start) as f32 * tw - region.x_offset,
                        (j - region.j_start) as f32 * th - region.y_offset,
                    );
                    sink.blit(*atlas, dest, *src);
                }
            }
        }
    }
}
