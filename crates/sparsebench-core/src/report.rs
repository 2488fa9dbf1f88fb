//! Timing lines and the final benchmark report.

use std::fmt;
use std::time::Duration;

use crate::driver::PageOp;
use crate::grid::TileSize;
use crate::timing::{millis, CallStats};

/// One per-call timing line, e.g. `TIME COMMIT 0.012000ms | 128 128 | 0`.
#[derive(Debug, Clone, Copy)]
pub struct CallLine {
    pub op: PageOp,
    pub elapsed: Duration,
    pub tile: TileSize,
    pub level: u32,
}

impl fmt::Display for CallLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TIME {} {:.6}ms | {} {} | {}",
            self.op.label(),
            millis(self.elapsed),
            self.tile.width,
            self.tile.height,
            self.level
        )
    }
}

/// Tiles visited on one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCount {
    pub level: u32,
    pub tiles: u64,
}

/// Outcome of one walk over the tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub op: PageOp,
    pub calls: CallStats,
    pub levels: Vec<LevelCount>,
}

impl PassSummary {
    /// Number of page-commitment calls issued
    pub const fn count(&self) -> u64 {
        self.calls.count
    }
}

/// Aggregate results of a commit pass followed by an evict pass.
///
/// Spans come from clock samples at pass boundaries, so they include the time
/// between calls that the per-call statistics leave out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchReport {
    pub commit: PassSummary,
    pub evict: PassSummary,
    pub commit_span: Duration,
    pub evict_span: Duration,
}

impl BenchReport {
    /// Wall-clock time of both passes
    pub fn total_span(&self) -> Duration {
        self.commit_span + self.evict_span
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOTAL COMMITS: {}", self.commit.count())?;
        writeln!(f, "TOTAL EVICTS: {}", self.evict.count())?;
        writeln!(f, "TOTAL COMMIT TIME: {:.6}ms", millis(self.commit_span))?;
        writeln!(f, "TOTAL EVICT TIME: {:.6}ms", millis(self.evict_span))?;
        writeln!(
            f,
            "TOTAL TIME (commit + evict): {:.6}ms",
            millis(self.total_span())
        )?;
        writeln!(f, "{}", CallStatsLine(&self.commit))?;
        write!(f, "{}", CallStatsLine(&self.evict))
    }
}

struct CallStatsLine<'a>(&'a PassSummary);

impl fmt::Display for CallStatsLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calls = &self.0.calls;
        write!(
            f,
            "{} CALLS: min {:.6}ms | mean {:.6}ms | max {:.6}ms",
            self.0.op.label(),
            millis(calls.min),
            millis(calls.mean()),
            millis(calls.max)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(op: PageOp, micros: &[u64]) -> PassSummary {
        let mut calls = CallStats::default();
        for &us in micros {
            calls.record(Duration::from_micros(us));
        }
        PassSummary {
            op,
            calls,
            levels: vec![LevelCount {
                level: 0,
                tiles: micros.len() as u64,
            }],
        }
    }

    #[test]
    fn call_line_format() {
        let line = CallLine {
            op: PageOp::Commit,
            elapsed: Duration::from_micros(12),
            tile: TileSize::new(128, 64, 1),
            level: 3,
        };
        assert_eq!(line.to_string(), "TIME COMMIT 0.012000ms | 128 64 | 3");
    }

    #[test]
    fn report_format() {
        let report = BenchReport {
            commit: summary(PageOp::Commit, &[10, 30, 20]),
            evict: summary(PageOp::Evict, &[5, 15, 10]),
            commit_span: Duration::from_micros(1500),
            evict_span: Duration::from_micros(250),
        };
        assert_eq!(report.total_span(), Duration::from_micros(1750));
        insta::assert_snapshot!(report.to_string(), @r"
        TOTAL COMMITS: 3
        TOTAL EVICTS: 3
        TOTAL COMMIT TIME: 1.500000ms
        TOTAL EVICT TIME: 0.250000ms
        TOTAL TIME (commit + evict): 1.750000ms
        COMMIT CALLS: min 0.010000ms | mean 0.020000ms | max 0.030000ms
        EVICT CALLS: min 0.005000ms | mean 0.010000ms | max 0.015000ms
        ");
    }
}
