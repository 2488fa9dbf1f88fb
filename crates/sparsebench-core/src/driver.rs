//! The seam between the passes and a graphics driver.

use std::fmt;

use crate::grid::{TileRegion, TileSize};
use crate::pattern::PixelBuffer;

/// Direction of a page-commitment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOp {
    /// Allocate backing memory for a tile.
    Commit,
    /// Release backing memory for a tile.
    Evict,
}

impl PageOp {
    /// Label used in timing lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Commit => "COMMIT",
            Self::Evict => "EVICT",
        }
    }

    /// Whether this request allocates memory.
    #[must_use]
    pub const fn commits(self) -> bool {
        matches!(self, Self::Commit)
    }
}

impl fmt::Display for PageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => f.write_str("commit"),
            Self::Evict => f.write_str("evict"),
        }
    }
}

/// A texture whose backing memory is committed and evicted one tile at a time.
///
/// Calls are issued from a single thread. `set_commitment` and `upload` do not
/// report failure themselves: the caller times `set_commitment` in isolation and
/// polls [`SparseTexture::take_fault`] afterwards.
pub trait SparseTexture {
    /// Driver failure raised by a previous call.
    type Fault: std::error::Error + Send + Sync + 'static;

    /// Page tile granularity queried for the texture's pixel format.
    fn tile_size(&self) -> TileSize;

    /// Issue one page-commitment request covering `region`.
    fn set_commitment(&mut self, region: &TileRegion, op: PageOp);

    /// Upload `pixels` into `region`.
    fn upload(&mut self, region: &TileRegion, pixels: &PixelBuffer);

    /// Return and clear the fault raised since the last poll, if any.
    fn take_fault(&mut self) -> Option<Self::Fault>;
}

impl<T: SparseTexture + ?Sized> SparseTexture for &mut T {
    type Fault = T::Fault;

    fn tile_size(&self) -> TileSize {
        (**self).tile_size()
    }

    fn set_commitment(&mut self, region: &TileRegion, op: PageOp) {
        (**self).set_commitment(region, op);
    }

    fn upload(&mut self, region: &TileRegion, pixels: &PixelBuffer) {
        (**self).upload(region, pixels);
    }

    fn take_fault(&mut self) -> Option<Self::Fault> {
        (**self).take_fault()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_labels() {
        assert_eq!(PageOp::Commit.label(), "COMMIT");
        assert_eq!(PageOp::Evict.label(), "EVICT");
        assert!(PageOp::Commit.commits());
        assert!(!PageOp::Evict.commits());
        assert_eq!(PageOp::Evict.to_string(), "evict");
    }
}
