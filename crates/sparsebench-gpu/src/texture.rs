//! Sparse 2D array texture backed by `ARB_sparse_texture`.

use sparsebench_core::{BenchConfig, PageOp, PixelBuffer, SparseTexture, TileRegion, TileSize};

use crate::context::GpuContext;
use crate::error::Result;
use crate::gl::{self, GLenum, GLint, GLuint, GlError, GlFunctions};

/// Allocation parameters of the sparse texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width and height of level 0
    pub size: u32,
    /// Levels of storage allocated
    pub storage_levels: u32,
    /// Highest level exposed through `TEXTURE_MAX_LEVEL`
    pub max_level: u32,
    /// Sized internal format
    pub internal_format: GLenum,
}

impl TextureDesc {
    /// Full mip chain of storage, sampling capped at the walked levels.
    pub const fn from_config(config: &BenchConfig) -> Self {
        Self {
            size: config.base_size,
            storage_levels: config.storage_levels(),
            max_level: config.max_levels.saturating_sub(1),
            internal_format: gl::RGBA8,
        }
    }
}

/// Sparse `TEXTURE_2D_ARRAY` with one layer, owning the context it lives in.
pub struct GlSparseTexture {
    context: GpuContext,
    name: GLuint,
    tile: TileSize,
}

impl GlSparseTexture {
    /// Allocate the texture on `context` and query its page size.
    pub fn create(context: GpuContext, desc: &TextureDesc) -> Result<Self> {
        let gl = context.gl();
        let mut name: GLuint = 0;

        // SAFETY: `context` is current on this thread for its whole lifetime.
        unsafe {
            gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 1);

            gl.create_textures(gl::TEXTURE_2D_ARRAY, 1, &mut name);
            let params = [
                (gl::TEXTURE_SWIZZLE_R, gl::RED as GLint),
                (gl::TEXTURE_SWIZZLE_G, gl::GREEN as GLint),
                (gl::TEXTURE_SWIZZLE_B, gl::BLUE as GLint),
                (gl::TEXTURE_SWIZZLE_A, gl::ALPHA as GLint),
                (gl::TEXTURE_BASE_LEVEL, 0),
                (gl::TEXTURE_MAX_LEVEL, desc.max_level as GLint),
                (gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_NEAREST as GLint),
                (gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint),
                // must precede storage allocation
                (gl::TEXTURE_SPARSE_ARB, GLint::from(gl::TRUE)),
            ];
            for (pname, value) in params {
                gl.texture_parameter_i(name, pname, value);
            }

            gl.texture_storage_3d(
                name,
                desc.storage_levels as i32,
                desc.internal_format,
                desc.size as i32,
                desc.size as i32,
                1,
            );

            if let Some(err) = gl.take_error() {
                gl.delete_textures(1, &name);
                gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 4);
                return Err(err.into());
            }
        }

        // SAFETY: as above.
        let tile = unsafe { page_size(gl, gl::TEXTURE_2D_ARRAY, desc.internal_format) };
        tracing::info!(
            texture = name,
            size = desc.size,
            levels = desc.storage_levels,
            %tile,
            "Sparse texture allocated"
        );

        // SAFETY: as above.
        let volume_tile = unsafe { page_size(gl, gl::TEXTURE_3D, gl::RGBA32F) };
        tracing::debug!(tile = %volume_tile, "3D RGBA32F page size");

        Ok(Self {
            context,
            name,
            tile,
        })
    }
}

/// Query the virtual page size of `format` for `target`.
///
/// # Safety
/// The context `gl` was loaded from must be current.
unsafe fn page_size(gl: &GlFunctions, target: GLenum, format: GLenum) -> TileSize {
    let query = |pname| {
        let mut value: GLint = 0;
        unsafe { gl.get_internalformat_iv(target, format, pname, 1, &mut value) };
        u32::try_from(value).unwrap_or(0)
    };

    TileSize::new(
        query(gl::VIRTUAL_PAGE_SIZE_X_ARB),
        query(gl::VIRTUAL_PAGE_SIZE_Y_ARB),
        query(gl::VIRTUAL_PAGE_SIZE_Z_ARB),
    )
}

impl SparseTexture for GlSparseTexture {
    type Fault = GlError;

    fn tile_size(&self) -> TileSize {
        self.tile
    }

    fn set_commitment(&mut self, region: &TileRegion, op: PageOp) {
        let commit = if op.commits() { gl::TRUE } else { gl::FALSE };
        // SAFETY: the context is current; the region lies inside the allocated levels.
        unsafe {
            self.context.gl().texture_page_commitment(
                self.name,
                region.level as GLint,
                region.offset.x as GLint,
                region.offset.y as GLint,
                region.offset.z as GLint,
                region.extent.x as i32,
                region.extent.y as i32,
                region.extent.z as i32,
                commit,
            );
        }
    }

    fn upload(&mut self, region: &TileRegion, pixels: &PixelBuffer) {
        debug_assert_eq!(
            pixels.texels().len(),
            (region.extent.x * region.extent.y * region.extent.z) as usize
        );
        // SAFETY: the context is current and `pixels` holds exactly one region of RGBA8 texels.
        unsafe {
            self.context.gl().texture_sub_image_3d(
                self.name,
                region.level as GLint,
                region.offset.x as GLint,
                region.offset.y as GLint,
                region.offset.z as GLint,
                region.extent.x as i32,
                region.extent.y as i32,
                region.extent.z as i32,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.as_bytes().as_ptr().cast(),
            );
        }
    }

    fn take_fault(&mut self) -> Option<GlError> {
        // SAFETY: the context is current.
        unsafe { self.context.gl().take_error() }
    }
}

impl Drop for GlSparseTexture {
    fn drop(&mut self) {
        let gl = self.context.gl();
        // SAFETY: the context is still current; it is dropped after this texture.
        unsafe {
            gl.delete_textures(1, &self.name);
            gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 4);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desc_from_default_config() {
        let desc = TextureDesc::from_config(&BenchConfig::default());
        assert_eq!(desc.size, 32768);
        assert_eq!(desc.storage_levels, 16);
        assert_eq!(desc.max_level, 3);
        assert_eq!(desc.internal_format, gl::RGBA8);
    }

    #[test]
    fn desc_caps_sampled_levels() {
        let config = BenchConfig::new().base_size(1024).max_levels(1);
        let desc = TextureDesc::from_config(&config);
        assert_eq!(desc.storage_levels, 11);
        assert_eq!(desc.max_level, 0);
    }
}
