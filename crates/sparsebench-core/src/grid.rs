//! Tile grids over the mip chain of a sparse texture.

use std::fmt;

use glam::UVec3;

use crate::config::BenchConfig;
use crate::error::{Error, Result};

/// Page tile granularity in texels, as reported by the driver for one pixel format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl TileSize {
    /// Create a new tile size
    #[inline]
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of texels in one layer of a tile.
    ///
    /// Regions are always one layer deep, whatever depth the driver reports.
    #[inline]
    pub const fn layer_texel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Convert to glam UVec3
    #[inline]
    pub const fn as_uvec3(self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth)
    }

    /// Reject a granularity the tile walk cannot use.
    pub fn validate(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(Error::InvalidTileSize(format!(
                "driver reported {self}; is sparse texture support available?"
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Position of a tile within one mip level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub level: u32,
    pub row: u32,
    pub column: u32,
}

impl TileCoord {
    /// Texel region covered by this tile.
    #[inline]
    pub fn region(self, tile: TileSize) -> TileRegion {
        TileRegion {
            level: self.level,
            offset: UVec3::new(tile.width * self.column, tile.height * self.row, 0),
            extent: UVec3::new(tile.width, tile.height, 1),
        }
    }
}

/// Texel region of one tile on one mip level.
///
/// Always exactly one tile wide, one tile high and one layer deep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRegion {
    pub level: u32,
    pub offset: UVec3,
    pub extent: UVec3,
}

/// Tile layout of a single mip level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelGrid {
    /// Mip level index
    pub level: u32,
    /// Edge length of this level in texels
    pub edge: u32,
    /// Tiles per row
    pub tiles_x: u32,
    /// Tiles per column
    pub tiles_y: u32,
}

impl LevelGrid {
    /// Lay out `level` of a texture whose level 0 is `base_size` texels wide.
    ///
    /// Counts are truncated; partial tiles at the level edge are not walked.
    pub const fn new(base_size: u32, level: u32, tile: TileSize) -> Self {
        let edge = base_size >> level;
        Self {
            level,
            edge,
            tiles_x: edge / tile.width,
            tiles_y: edge / tile.height,
        }
    }

    /// Number of tiles on this level
    #[inline]
    pub const fn tile_count(&self) -> u64 {
        self.tiles_x as u64 * self.tiles_y as u64
    }

    /// Whether the tile size divides this level exactly.
    pub const fn is_exact(&self, tile: TileSize) -> bool {
        self.edge % tile.width == 0 && self.edge % tile.height == 0
    }

    /// Tiles in row-major order: rows outer, columns inner.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let level = self.level;
        let tiles_x = self.tiles_x;
        (0..self.tiles_y).flat_map(move |row| {
            (0..tiles_x).map(move |column| TileCoord { level, row, column })
        })
    }
}

/// Tile layout of every walked mip level.
#[derive(Clone, Debug)]
pub struct MipTiling {
    tile: TileSize,
    levels: Vec<LevelGrid>,
}

impl MipTiling {
    /// Lay out the first `config.max_levels` levels for the given tile size.
    pub fn new(config: &BenchConfig, tile: TileSize) -> Result<Self> {
        config.validate()?;
        let tile = tile.validate()?;

        let levels: Vec<LevelGrid> = (0..config.max_levels)
            .map(|level| LevelGrid::new(config.base_size, level, tile))
            .collect();

        for grid in levels.iter().filter(|grid| !grid.is_exact(tile)) {
            tracing::warn!(
                level = grid.level,
                edge = grid.edge,
                %tile,
                "tile size does not divide level; edge texels are skipped"
            );
        }

        Ok(Self { tile, levels })
    }

    /// Tile granularity used for every level
    pub const fn tile(&self) -> TileSize {
        self.tile
    }

    /// Per-level layouts, level 0 first
    pub fn levels(&self) -> &[LevelGrid] {
        &self.levels
    }

    /// Tiles across all walked levels
    pub fn total_tiles(&self) -> u64 {
        self.levels.iter().map(LevelGrid::tile_count).sum()
    }
}
