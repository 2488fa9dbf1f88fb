//! Core types and pass logic for the sparse texture commitment benchmark.
//!
//! This crate provides:
//! - Benchmark configuration and compile-time defaults
//! - Mip level tile grids and tile region math
//! - The synthetic per-tile color pattern and the reusable pixel buffer
//! - Per-call timing statistics and the final report
//! - The commit and evict passes, driven through the [`SparseTexture`] trait

pub mod bench;
pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod pattern;
pub mod report;
pub mod timing;

pub use bench::{execute, SparseBenchmark};
pub use config::BenchConfig;
pub use driver::{PageOp, SparseTexture};
pub use error::{BoxError, Error, Result};
pub use grid::{LevelGrid, MipTiling, TileCoord, TileRegion, TileSize};
pub use pattern::{tile_color, PixelBuffer, Rgba8};
pub use report::{BenchReport, CallLine, LevelCount, PassSummary};
pub use timing::CallStats;

/// Benchmark-wide constants
pub mod constants {
    /// Edge length of mip level 0 in texels
    pub const BASE_SIZE: u32 = 32768;
    /// Number of mip levels walked by the commit and evict passes
    pub const MAX_LEVELS: u32 = 4;
}
