//! GPU error types.

use khronos_egl as egl;
use thiserror::Error;

use crate::gl::GlError;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// The EGL library could not be loaded.
    #[error("Failed to load EGL: {0}")]
    EglLoad(String),

    /// An EGL call failed.
    #[error("{call} failed: {source}")]
    Egl {
        call: &'static str,
        #[source]
        source: egl::Error,
    },

    /// Device enumeration returned nothing.
    #[error("No EGL devices found")]
    NoDevices,

    /// The platform display for a device could not be opened.
    #[error("No EGL display for device {0}")]
    NoDisplay(usize),

    /// No framebuffer configuration matched the required attributes.
    #[error("No EGL config matches the required attributes")]
    NoMatchingConfig,

    /// The context could not be made current on this thread.
    #[error("eglMakeCurrent failure: {0}")]
    MakeCurrent(#[source] egl::Error),

    /// A driver entry point could not be resolved.
    #[error("Failed to load driver function {0}")]
    FunctionLoad(&'static str),

    /// An EGL call reported failure without raising an EGL error.
    #[error("{0} failed without an EGL error")]
    EglCallFailed(&'static str),

    /// The sparse texture could not be allocated.
    #[error("Sparse texture creation failed: {0}")]
    TextureCreation(#[from] GlError),
}

impl GpuError {
    /// Wrap an EGL failure with the name of the failing call.
    pub(crate) fn egl(call: &'static str) -> impl Fn(egl::Error) -> Self {
        move |source| Self::Egl { call, source }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
