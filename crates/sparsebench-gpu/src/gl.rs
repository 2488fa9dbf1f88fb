//! OpenGL entry points resolved from the driver at runtime.
//!
//! Only the handful of calls the benchmark issues are bound. Sparse page
//! commitment is an extension entry point, so the whole table is resolved
//! through the context's address lookup rather than linked.

use std::ffi::{c_void, CStr};
use std::fmt;

use crate::error::{GpuError, Result};

pub type GLenum = u32;
pub type GLint = i32;
pub type GLuint = u32;
pub type GLsizei = i32;
pub type GLboolean = u8;
pub type GLubyte = u8;

pub const FALSE: GLboolean = 0;
pub const TRUE: GLboolean = 1;

pub const NO_ERROR: GLenum = 0;
pub const INVALID_ENUM: GLenum = 0x0500;
pub const INVALID_VALUE: GLenum = 0x0501;
pub const INVALID_OPERATION: GLenum = 0x0502;
pub const STACK_OVERFLOW: GLenum = 0x0503;
pub const STACK_UNDERFLOW: GLenum = 0x0504;
pub const OUT_OF_MEMORY: GLenum = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;
pub const CONTEXT_LOST: GLenum = 0x0507;

pub const VENDOR: GLenum = 0x1F00;
pub const RENDERER: GLenum = 0x1F01;
pub const VERSION: GLenum = 0x1F02;
pub const EXTENSIONS: GLenum = 0x1F03;
pub const NUM_EXTENSIONS: GLenum = 0x821D;

pub const UNPACK_ALIGNMENT: GLenum = 0x0CF5;

pub const TEXTURE_3D: GLenum = 0x806F;
pub const TEXTURE_2D_ARRAY: GLenum = 0x8C1A;

pub const RED: GLenum = 0x1903;
pub const GREEN: GLenum = 0x1904;
pub const BLUE: GLenum = 0x1905;
pub const ALPHA: GLenum = 0x1906;
pub const RGBA: GLenum = 0x1908;
pub const RGBA8: GLenum = 0x8058;
pub const RGBA32F: GLenum = 0x8814;
pub const UNSIGNED_BYTE: GLenum = 0x1401;

pub const TEXTURE_MAG_FILTER: GLenum = 0x2800;
pub const TEXTURE_MIN_FILTER: GLenum = 0x2801;
pub const LINEAR: GLenum = 0x2601;
pub const LINEAR_MIPMAP_NEAREST: GLenum = 0x2701;
pub const TEXTURE_BASE_LEVEL: GLenum = 0x813C;
pub const TEXTURE_MAX_LEVEL: GLenum = 0x813D;
pub const TEXTURE_SWIZZLE_R: GLenum = 0x8E42;
pub const TEXTURE_SWIZZLE_G: GLenum = 0x8E43;
pub const TEXTURE_SWIZZLE_B: GLenum = 0x8E44;
pub const TEXTURE_SWIZZLE_A: GLenum = 0x8E45;

// ARB_sparse_texture
pub const TEXTURE_SPARSE_ARB: GLenum = 0x91A6;
pub const VIRTUAL_PAGE_SIZE_X_ARB: GLenum = 0x9195;
pub const VIRTUAL_PAGE_SIZE_Y_ARB: GLenum = 0x9196;
pub const VIRTUAL_PAGE_SIZE_Z_ARB: GLenum = 0x9197;

/// Error flags drained per poll; a lost context can keep reporting forever.
const MAX_ERROR_DRAIN: usize = 8;

macro_rules! gl_functions {
    ($(
        $(#[$meta:meta])*
        $name:ident = $symbol:literal => fn($($arg:ident: $ty:ty),*) $(-> $ret:ty)?;
    )*) => {
        /// Driver function table for the current context.
        pub struct GlFunctions {
            $($name: unsafe extern "system" fn($($ty),*) $(-> $ret)?,)*
        }

        impl GlFunctions {
            /// Resolve every entry point through `loader`.
            ///
            /// Fails with the first symbol the loader cannot resolve.
            pub fn load<F>(mut loader: F) -> Result<Self>
            where
                F: FnMut(&'static str) -> *const c_void,
            {
                Ok(Self {
                    $($name: {
                        let ptr = loader($symbol);
                        if ptr.is_null() {
                            return Err(GpuError::FunctionLoad($symbol));
                        }
                        // SAFETY: non-null address returned by the driver for this
                        // symbol, whose C signature matches the declared type.
                        unsafe {
                            std::mem::transmute::<
                                *const c_void,
                                unsafe extern "system" fn($($ty),*) $(-> $ret)?,
                            >(ptr)
                        }
                    },)*
                })
            }

            $(
                $(#[$meta])*
                ///
                /// # Safety
                /// The context this table was loaded from must be current and the
                /// arguments must satisfy the GL specification for this call.
                #[inline]
                pub unsafe fn $name(&self, $($arg: $ty),*) $(-> $ret)? {
                    unsafe { (self.$name)($($arg),*) }
                }
            )*
        }
    };
}

gl_functions! {
    /// `glGetError`
    get_error = "glGetError" => fn() -> GLenum;
    /// `glGetString`
    get_string = "glGetString" => fn(name: GLenum) -> *const GLubyte;
    /// `glGetStringi`
    get_string_i = "glGetStringi" => fn(name: GLenum, index: GLuint) -> *const GLubyte;
    /// `glGetIntegerv`
    get_integer_v = "glGetIntegerv" => fn(pname: GLenum, data: *mut GLint);
    /// `glPixelStorei`
    pixel_store_i = "glPixelStorei" => fn(pname: GLenum, param: GLint);
    /// `glCreateTextures`
    create_textures = "glCreateTextures" => fn(target: GLenum, n: GLsizei, textures: *mut GLuint);
    /// `glDeleteTextures`
    delete_textures = "glDeleteTextures" => fn(n: GLsizei, textures: *const GLuint);
    /// `glTextureParameteri`
    texture_parameter_i = "glTextureParameteri" => fn(texture: GLuint, pname: GLenum, param: GLint);
    /// `glTextureStorage3D`
    texture_storage_3d = "glTextureStorage3D" => fn(
        texture: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei
    );
    /// `glGetInternalformativ`
    get_internalformat_iv = "glGetInternalformativ" => fn(
        target: GLenum,
        internal_format: GLenum,
        pname: GLenum,
        count: GLsizei,
        params: *mut GLint
    );
    /// `glTexturePageCommitmentEXT`
    texture_page_commitment = "glTexturePageCommitmentEXT" => fn(
        texture: GLuint,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        zoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
        commit: GLboolean
    );
    /// `glTextureSubImage3D`
    texture_sub_image_3d = "glTextureSubImage3D" => fn(
        texture: GLuint,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        zoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: *const c_void
    );
}

impl GlFunctions {
    /// Drain the error flags, returning the first one raised.
    ///
    /// # Safety
    /// The context this table was loaded from must be current.
    pub unsafe fn take_error(&self) -> Option<GlError> {
        let mut first = None;
        for _ in 0..MAX_ERROR_DRAIN {
            let code = unsafe { self.get_error() };
            if code == NO_ERROR {
                break;
            }
            first.get_or_insert(GlError { code });
        }
        first
    }

    /// Read a driver string such as [`VENDOR`], empty when unavailable.
    ///
    /// # Safety
    /// The context this table was loaded from must be current.
    pub unsafe fn string(&self, name: GLenum) -> String {
        unsafe { owned_string(self.get_string(name)) }
    }

    /// Read the extension names exposed by a core profile context.
    ///
    /// # Safety
    /// The context this table was loaded from must be current.
    pub unsafe fn extensions(&self) -> Vec<String> {
        let mut count: GLint = 0;
        unsafe { self.get_integer_v(NUM_EXTENSIONS, &mut count) };
        (0..count.max(0) as GLuint)
            .map(|i| unsafe { owned_string(self.get_string_i(EXTENSIONS, i)) })
            .filter(|name| !name.is_empty())
            .collect()
    }
}

unsafe fn owned_string(ptr: *const GLubyte) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr.cast()) }
        .to_string_lossy()
        .into_owned()
}

/// An error flag raised by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlError {
    pub code: GLenum,
}

impl GlError {
    /// Symbolic name of the error code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.code {
            INVALID_ENUM => "GL_INVALID_ENUM",
            INVALID_VALUE => "GL_INVALID_VALUE",
            INVALID_OPERATION => "GL_INVALID_OPERATION",
            STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => "unknown GL error",
        }
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.code)
    }
}

impl std::error::Error for GlError {}
