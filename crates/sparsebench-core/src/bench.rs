//! Commit and evict passes over a sparse texture.

use std::io::Write;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::BenchConfig;
use crate::driver::{PageOp, SparseTexture};
use crate::error::{BoxError, Error, Result};
use crate::grid::MipTiling;
use crate::pattern::{tile_color, PixelBuffer};
use crate::report::{BenchReport, CallLine, LevelCount, PassSummary};
use crate::timing::{timed, CallStats};

/// Drives page-commitment requests over every tile of the walked mip levels.
pub struct SparseBenchmark<T> {
    texture: T,
    tiling: MipTiling,
    max_levels: u32,
    pixels: PixelBuffer,
}

impl<T: SparseTexture> SparseBenchmark<T> {
    /// Lay out the tile grid using the texture's reported tile size.
    pub fn new(texture: T, config: &BenchConfig) -> Result<Self> {
        let tiling = MipTiling::new(config, texture.tile_size())?;
        let pixels = PixelBuffer::new(tiling.tile());

        info!(
            tile = %tiling.tile(),
            levels = config.max_levels,
            tiles = tiling.total_tiles(),
            "Sparse tile grid ready"
        );

        Ok(Self {
            texture,
            tiling,
            max_levels: config.max_levels,
            pixels,
        })
    }

    /// Tile layout walked by both passes.
    pub const fn tiling(&self) -> &MipTiling {
        &self.tiling
    }

    /// The texture under test.
    pub const fn texture(&self) -> &T {
        &self.texture
    }

    /// Release the benchmark and hand back the texture.
    pub fn into_texture(self) -> T {
        self.texture
    }

    /// Commit and fill every tile, then evict every tile, then write the report.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<BenchReport> {
        let start = Instant::now();
        let commit = self.commit_pass(out)?;
        let commit_end = Instant::now();
        let evict = self.evict_pass(out)?;
        let end = Instant::now();

        let report = BenchReport {
            commit,
            evict,
            commit_span: commit_end - start,
            evict_span: end - commit_end,
        };
        writeln!(out, "{report}")?;
        out.flush()?;

        Ok(report)
    }

    /// Commit backing memory for every tile and upload its color.
    pub fn commit_pass<W: Write>(&mut self, out: &mut W) -> Result<PassSummary> {
        self.walk(PageOp::Commit, out)
    }

    /// Release backing memory for every tile.
    pub fn evict_pass<W: Write>(&mut self, out: &mut W) -> Result<PassSummary> {
        self.walk(PageOp::Evict, out)
    }

    fn walk<W: Write>(&mut self, op: PageOp, out: &mut W) -> Result<PassSummary> {
        let tile = self.tiling.tile();
        let mut calls = CallStats::default();
        let mut levels = Vec::with_capacity(self.tiling.levels().len());

        info!(%op, "Starting pass");

        for grid in self.tiling.levels() {
            debug!(
                level = grid.level,
                edge = grid.edge,
                tiles_x = grid.tiles_x,
                tiles_y = grid.tiles_y,
                "Walking mip level"
            );

            let mut tiles = 0u64;
            for coord in grid.tiles() {
                let region = coord.region(tile);

                if op.commits() {
                    self.pixels.fill(tile_color(coord, grid, self.max_levels));
                }

                let ((), elapsed) = timed(|| self.texture.set_commitment(&region, op));
                calls.record(elapsed);
                tiles += 1;

                writeln!(
                    out,
                    "{}",
                    CallLine {
                        op,
                        elapsed,
                        tile,
                        level: grid.level,
                    }
                )?;

                if let Some(fault) = self.texture.take_fault() {
                    return Err(Error::CommitFailed {
                        op,
                        level: coord.level,
                        row: coord.row,
                        column: coord.column,
                        source: Box::new(fault),
                    });
                }

                if op.commits() {
                    self.texture.upload(&region, &self.pixels);
                    if let Some(fault) = self.texture.take_fault() {
                        return Err(Error::UploadFailed {
                            level: coord.level,
                            row: coord.row,
                            column: coord.column,
                            source: Box::new(fault),
                        });
                    }
                }
            }

            levels.push(LevelCount {
                level: grid.level,
                tiles,
            });
        }

        info!(%op, calls = calls.count, total = ?calls.total, "Pass complete");

        Ok(PassSummary { op, calls, levels })
    }
}

/// Bootstrap a texture with `setup`, run both passes and write the report to `out`.
///
/// A failing `setup` issues no texture operations and maps to [`Error::Setup`].
pub fn execute<T, E, F, W>(config: &BenchConfig, setup: F, out: &mut W) -> Result<BenchReport>
where
    T: SparseTexture,
    E: Into<BoxError>,
    F: FnOnce(&BenchConfig) -> std::result::Result<T, E>,
    W: Write,
{
    config.validate()?;

    let texture = setup(config).map_err(|e| Error::Setup(e.into()))?;
    let mut bench = SparseBenchmark::new(texture, config)?;
    bench.run(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{Call, CountingTexture, RecordingTexture};
    use crate::grid::{TileCoord, TileSize};
    use crate::pattern::Rgba8;
    use glam::UVec3;

    const TILE: TileSize = TileSize::new(128, 128, 1);

    fn small_config() -> BenchConfig {
        BenchConfig::new().base_size(512).max_levels(3)
    }

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn commit_and_evict_are_symmetric() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        let mut out = Vec::new();
        let report = bench.run(&mut out).unwrap();

        let expected = [
            LevelCount { level: 0, tiles: 16 },
            LevelCount { level: 1, tiles: 4 },
            LevelCount { level: 2, tiles: 1 },
        ];
        assert_eq!(report.commit.levels, expected);
        assert_eq!(report.evict.levels, expected);
        assert_eq!(report.commit.count(), 21);
        assert_eq!(report.evict.count(), 21);

        let texture = bench.into_texture();
        let committed: Vec<_> = texture.commitments(PageOp::Commit).copied().collect();
        let evicted: Vec<_> = texture.commitments(PageOp::Evict).copied().collect();
        assert_eq!(committed, evicted);
    }

    #[test]
    fn commit_precedes_upload_of_same_region() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        bench.commit_pass(&mut std::io::sink()).unwrap();

        let calls = &bench.texture().calls;
        assert_eq!(calls.len(), 42);
        for pair in calls.chunks(2) {
            match pair {
                [Call::Commitment(committed, PageOp::Commit), Call::Upload(uploaded, _, texels)] => {
                    assert_eq!(committed, uploaded);
                    assert_eq!(*texels, TILE.layer_texel_count());
                }
                other => panic!("unexpected call order: {other:?}"),
            }
        }
    }

    #[test]
    fn deep_pages_upload_one_layer_per_tile() {
        let tile = TileSize::new(128, 128, 2);
        let mut bench = SparseBenchmark::new(RecordingTexture::new(tile), &small_config()).unwrap();
        bench.commit_pass(&mut std::io::sink()).unwrap();

        for call in &bench.texture().calls {
            if let Call::Upload(region, _, texels) = call {
                assert_eq!(region.extent, UVec3::new(128, 128, 1));
                assert_eq!(*texels, 128 * 128);
            }
        }
        assert_eq!(bench.texture().uploads().count(), 21);
    }

    #[test]
    fn evict_pass_uploads_nothing() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        bench.evict_pass(&mut std::io::sink()).unwrap();
        assert_eq!(bench.texture().uploads().count(), 0);
        assert_eq!(bench.texture().commitments(PageOp::Evict).count(), 21);
    }

    #[test]
    fn uploads_carry_tile_colors() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        bench.commit_pass(&mut std::io::sink()).unwrap();

        let uploads: Vec<_> = bench.texture().uploads().collect();
        // level 0 is 4x4 tiles; row 1, column 2 is the seventh tile
        let (region, color) = uploads[6];
        assert_eq!(region.offset, UVec3::new(256, 128, 0));
        assert_eq!(color, Rgba8::new(127, 63, 0, 255));

        let (region, color) = uploads[20];
        assert_eq!(region.level, 2);
        assert_eq!(region.offset, UVec3::ZERO);
        assert_eq!(color, Rgba8::new(0, 0, 170, 255));
    }

    #[test]
    fn tiles_walk_row_major_per_level() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        bench.evict_pass(&mut std::io::sink()).unwrap();

        let regions: Vec<_> = bench.texture().commitments(PageOp::Evict).take(5).collect();
        let expected: Vec<_> = [(0, 0), (0, 1), (0, 2), (0, 3), (1, 0)]
            .into_iter()
            .map(|(row, column)| TileCoord { level: 0, row, column }.region(TILE))
            .collect();
        assert_eq!(regions, expected.iter().collect::<Vec<_>>());
    }

    #[test]
    fn writes_one_line_per_call_then_report() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        let mut out = Vec::new();
        bench.run(&mut out).unwrap();

        let lines = lines(&out);
        assert_eq!(lines.len(), 21 + 21 + 7);
        assert!(lines[..21].iter().all(|l| l.starts_with("TIME COMMIT ")));
        assert!(lines[21..42].iter().all(|l| l.starts_with("TIME EVICT ")));
        assert!(lines[0].ends_with("ms | 128 128 | 0"));
        assert!(lines[20].ends_with("ms | 128 128 | 2"));
        assert_eq!(lines[42], "TOTAL COMMITS: 21");
        assert_eq!(lines[43], "TOTAL EVICTS: 21");
        assert!(lines[46].starts_with("TOTAL TIME (commit + evict): "));
    }

    #[test]
    fn pass_spans_cover_per_call_time() {
        let mut bench = SparseBenchmark::new(RecordingTexture::new(TILE), &small_config()).unwrap();
        let report = bench.run(&mut std::io::sink()).unwrap();

        assert!(report.commit_span >= report.commit.calls.total);
        assert!(report.evict_span >= report.evict.calls.total);
        assert!(report.commit.calls.min <= report.commit.calls.max);
        assert_eq!(report.total_span(), report.commit_span + report.evict_span);
    }

    #[test]
    fn commitment_fault_stops_the_pass() {
        let mut texture = RecordingTexture::new(TILE);
        texture.fail_commitment_at = Some(21 + 5);
        let mut bench = SparseBenchmark::new(texture, &small_config()).unwrap();

        let err = bench.run(&mut std::io::sink()).unwrap_err();
        match err {
            Error::CommitFailed {
                op,
                level,
                row,
                column,
                ..
            } => assert_eq!((op, level, row, column), (PageOp::Evict, 0, 1, 1)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bench.texture().commitments(PageOp::Evict).count(), 6);
    }

    #[test]
    fn upload_fault_is_reported() {
        let mut texture = RecordingTexture::new(TILE);
        texture.fail_upload_at = Some(0);
        let mut bench = SparseBenchmark::new(texture, &small_config()).unwrap();

        let err = bench.commit_pass(&mut std::io::sink()).unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailed {
                level: 0,
                row: 0,
                column: 0,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn failed_setup_touches_no_texture() {
        let mut out = Vec::new();
        let result = execute(
            &BenchConfig::default(),
            |_| Err::<RecordingTexture, _>("No EGL devices found"),
            &mut out,
        );

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Setup(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_tile_size_fails_as_setup() {
        let mut out = Vec::new();
        let err = execute(
            &BenchConfig::default(),
            |_| Ok::<_, Error>(RecordingTexture::new(TileSize::default())),
            &mut out,
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_config_skips_setup() {
        let mut called = false;
        let err = execute(
            &BenchConfig::new().base_size(1000),
            |_| {
                called = true;
                Ok::<_, Error>(RecordingTexture::new(TILE))
            },
            &mut std::io::sink(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(!called);
    }

    #[test]
    fn reference_run_issues_87040_calls_each_way() {
        let mut texture = CountingTexture {
            tile: TILE,
            ..CountingTexture::default()
        };
        let handle = &mut texture;
        let report = execute(
            &BenchConfig::default(),
            move |_| Ok::<_, Error>(handle),
            &mut std::io::sink(),
        )
        .unwrap();

        assert_eq!(report.commit.count(), 87_040);
        assert_eq!(report.evict.count(), 87_040);
        assert_eq!(
            report.commit.levels.iter().map(|l| l.tiles).collect::<Vec<_>>(),
            [65_536, 16_384, 4_096, 1_024]
        );
        assert_eq!(report.commit.levels, report.evict.levels);
        assert_eq!(texture.commits, 87_040);
        assert_eq!(texture.evicts, 87_040);
        assert_eq!(texture.uploads, 87_040);
    }
}
