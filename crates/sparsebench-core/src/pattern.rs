//! Synthetic tile colors and the reusable upload buffer.

use bytemuck::{Pod, Zeroable};

use crate::grid::{LevelGrid, TileCoord, TileSize};

/// One RGBA8 texel, laid out as the driver expects for `RGBA`/`UNSIGNED_BYTE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    /// Create a new color
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Color uploaded into every texel of a tile.
///
/// Red follows the column, green the row and blue the mip level, each as a
/// fraction of its range scaled to 255. Alpha is opaque.
pub fn tile_color(coord: TileCoord, grid: &LevelGrid, max_levels: u32) -> Rgba8 {
    Rgba8::new(
        channel(coord.column, grid.tiles_x),
        channel(coord.row, grid.tiles_y),
        channel(coord.level, max_levels),
        u8::MAX,
    )
}

#[inline]
fn channel(index: u32, count: u32) -> u8 {
    // float-to-int `as` saturates
    (index as f32 / count as f32 * 255.0) as u8
}

/// CPU-side texels for exactly one tile, overwritten for every tile.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    texels: Vec<Rgba8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer sized to one layer of a tile.
    pub fn new(tile: TileSize) -> Self {
        Self {
            texels: vec![Rgba8::default(); tile.layer_texel_count()],
        }
    }

    /// Overwrite every texel with `color`.
    #[inline]
    pub fn fill(&mut self, color: Rgba8) {
        self.texels.fill(color);
    }

    /// Texels in upload order
    pub fn texels(&self) -> &[Rgba8] {
        &self.texels
    }

    /// Raw bytes for the driver upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}
