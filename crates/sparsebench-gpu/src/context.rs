//! Offscreen GL context management.

use std::ffi::c_void;
use std::ptr;

use khronos_egl as egl;

use crate::capabilities::{GlInfo, PlatformInfo};
use crate::display::{enumerate_devices, load_egl, open_device_display, Egl};
use crate::error::{GpuError, Result};
use crate::gl::GlFunctions;

/// Device used for the offscreen display; there is no selection policy.
pub const DEVICE_INDEX: usize = 0;

// EGL_KHR_create_context
const CONTEXT_MAJOR_VERSION_KHR: egl::Int = 0x3098;
const CONTEXT_MINOR_VERSION_KHR: egl::Int = 0x30FB;
const CONTEXT_FLAGS_KHR: egl::Int = 0x30FC;
const CONTEXT_OPENGL_PROFILE_MASK_KHR: egl::Int = 0x30FD;
const CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR: egl::Int = 0x0000_0001;
const CONTEXT_OPENGL_DEBUG_BIT_KHR: egl::Int = 0x0000_0001;

/// Framebuffer configuration: 8-bit RGB, 24-bit depth, 8-bit stencil, pbuffer-capable, desktop GL.
pub(crate) const CONFIG_ATTRIBUTES: [egl::Int; 15] = [
    egl::RENDERABLE_TYPE,
    egl::OPENGL_BIT,
    egl::SURFACE_TYPE,
    egl::PBUFFER_BIT,
    egl::BLUE_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::RED_SIZE,
    8,
    egl::DEPTH_SIZE,
    24,
    egl::STENCIL_SIZE,
    8,
    egl::NONE,
];

/// Attribute list requesting a core profile context of the given version.
pub(crate) const fn context_attributes(major: u8, minor: u8, debug: bool) -> [egl::Int; 9] {
    [
        CONTEXT_MAJOR_VERSION_KHR,
        major as egl::Int,
        CONTEXT_MINOR_VERSION_KHR,
        minor as egl::Int,
        CONTEXT_FLAGS_KHR,
        if debug { CONTEXT_OPENGL_DEBUG_BIT_KHR } else { 0 },
        CONTEXT_OPENGL_PROFILE_MASK_KHR,
        CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR,
        egl::NONE,
    ]
}

/// Attribute list for a `width` x `height` pbuffer.
pub(crate) const fn pbuffer_attributes(width: u32, height: u32) -> [egl::Int; 5] {
    [
        egl::WIDTH,
        width as egl::Int,
        egl::HEIGHT,
        height as egl::Int,
        egl::NONE,
    ]
}

/// Offscreen GL context current on the creating thread.
///
/// Owns the display, pbuffer surface and context; all are released on drop.
pub struct GpuContext {
    egl: Egl,
    display: egl::Display,
    surface: egl::Surface,
    context: egl::Context,
    gl: GlFunctions,
}

impl GpuContext {
    /// Get the driver function table.
    pub const fn gl(&self) -> &GlFunctions {
        &self.gl
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        if let Err(e) = self.egl.make_current(self.display, None, None, None) {
            tracing::warn!("Failed to release context: {e}");
        }
        if let Err(e) = self.egl.destroy_context(self.display, self.context) {
            tracing::warn!("Failed to destroy context: {e}");
        }
        if let Err(e) = self.egl.destroy_surface(self.display, self.surface) {
            tracing::warn!("Failed to destroy surface: {e}");
        }
        if let Err(e) = self.egl.terminate(self.display) {
            tracing::warn!("Failed to terminate display: {e}");
        }
    }
}

/// Builder for creating an offscreen GL context.
pub struct GpuContextBuilder {
    gl_version: (u8, u8),
    debug: bool,
    surface_size: (u32, u32),
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            gl_version: (4, 6),
            debug: false,
            surface_size: (1, 1),
        }
    }
}

impl GpuContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a GL core profile version.
    #[must_use]
    pub const fn gl_version(mut self, major: u8, minor: u8) -> Self {
        self.gl_version = (major, minor);
        self
    }

    /// Request a debug context.
    #[must_use]
    pub const fn debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    /// Build the context and make it current on the calling thread.
    pub fn build(self) -> Result<GpuContext> {
        let egl = load_egl()?;

        let devices = enumerate_devices(&egl)?;
        let device = devices[DEVICE_INDEX];

        let (display, egl_version) = open_device_display(&egl, device, DEVICE_INDEX)?;

        PlatformInfo::query(&egl, display, devices.len(), egl_version).log();

        match self.create_on_display(&egl, display) {
            Ok((surface, context, gl)) => Ok(GpuContext {
                egl,
                display,
                surface,
                context,
                gl,
            }),
            Err(e) => {
                // Terminating the display releases anything created on it
                let _ = egl.make_current(display, None, None, None);
                let _ = egl.terminate(display);
                Err(e)
            }
        }
    }

    fn create_on_display(
        &self,
        egl: &Egl,
        display: egl::Display,
    ) -> Result<(egl::Surface, egl::Context, GlFunctions)> {
        let config = egl
            .choose_first_config(display, &CONFIG_ATTRIBUTES)
            .map_err(GpuError::egl("eglChooseConfig"))?
            .ok_or(GpuError::NoMatchingConfig)?;

        let (width, height) = self.surface_size;
        let surface = egl
            .create_pbuffer_surface(display, config, &pbuffer_attributes(width, height))
            .map_err(GpuError::egl("eglCreatePbufferSurface"))?;

        egl.bind_api(egl::OPENGL_API)
            .map_err(GpuError::egl("eglBindAPI"))?;

        let (major, minor) = self.gl_version;
        let context = egl
            .create_context(display, config, None, &context_attributes(major, minor, self.debug))
            .map_err(GpuError::egl("eglCreateContext"))?;

        egl.make_current(display, Some(surface), Some(surface), Some(context))
            .map_err(GpuError::MakeCurrent)?;
        tracing::info!("EGL context: {:p}", context.as_ptr());

        let gl = GlFunctions::load(|symbol| {
            egl.get_proc_address(symbol)
                .map_or(ptr::null(), |f| f as *const c_void)
        })?;

        // SAFETY: the context `gl` was loaded from was made current above.
        let gl_info = unsafe { GlInfo::query(&gl) };
        tracing::info!("OpenGL: {}", gl_info.summary());

        gl_info.warn_missing_extensions();

        Ok((surface, context, gl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requests_pbuffer_rgb888_d24s8() {
        let pairs: Vec<_> = CONFIG_ATTRIBUTES.chunks(2).collect();
        assert!(pairs.contains(&&[egl::SURFACE_TYPE, egl::PBUFFER_BIT][..]));
        assert!(pairs.contains(&&[egl::RENDERABLE_TYPE, egl::OPENGL_BIT][..]));
        assert!(pairs.contains(&&[egl::DEPTH_SIZE, 24][..]));
        assert!(pairs.contains(&&[egl::STENCIL_SIZE, 8][..]));
        assert_eq!(CONFIG_ATTRIBUTES.last(), Some(&egl::NONE));
    }

    #[test]
    fn default_context_is_core_4_6_without_debug() {
        let builder = GpuContextBuilder::new();
        let (major, minor) = builder.gl_version;
        let attrs = context_attributes(major, minor, builder.debug);
        assert_eq!(
            attrs,
            [0x3098, 4, 0x30FB, 6, 0x30FC, 0, 0x30FD, 1, egl::NONE]
        );
    }

    #[test]
    fn debug_flag_sets_context_flags() {
        let attrs = context_attributes(4, 5, true);
        assert_eq!(&attrs[..6], &[0x3098, 4, 0x30FB, 5, 0x30FC, 1]);
    }

    #[test]
    fn pbuffer_is_one_pixel() {
        let (width, height) = GpuContextBuilder::default().surface_size;
        assert_eq!(
            pbuffer_attributes(width, height),
            [egl::WIDTH, 1, egl::HEIGHT, 1, egl::NONE]
        );
    }
}
