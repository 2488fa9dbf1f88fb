//! Platform and driver capability detection.

use std::collections::HashSet;

use khronos_egl as egl;

use crate::display::Egl;
use crate::gl::{self, GlFunctions};

/// GL extensions the sparse commitment path is written against.
///
/// Only reported. Core-profile drivers may resolve `glTexturePageCommitmentEXT`
/// without listing `GL_EXT_direct_state_access`; a missing entry point fails the
/// function table load instead.
pub const SPARSE_EXTENSIONS: [&str; 2] = ["GL_ARB_sparse_texture", "GL_EXT_direct_state_access"];

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Mesa,
    Other,
}

impl GpuVendor {
    /// Identify vendor from a driver vendor string.
    pub fn from_vendor_string(vendor: &str) -> Self {
        let vendor = vendor.to_ascii_lowercase();
        if vendor.contains("nvidia") {
            Self::Nvidia
        } else if vendor.contains("amd") || vendor.contains("ati technologies") {
            Self::Amd
        } else if vendor.contains("intel") {
            Self::Intel
        } else if vendor.contains("mesa") {
            Self::Mesa
        } else {
            Self::Other
        }
    }
}

/// EGL platform strings, reported for diagnostics only.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    /// Devices found by enumeration
    pub device_count: usize,
    /// EGL version returned by initialization
    pub egl_version: (i32, i32),
    /// Supported client APIs
    pub client_apis: String,
    /// EGL vendor string
    pub vendor: String,
    /// EGL version string
    pub version: String,
}

impl PlatformInfo {
    /// Query the platform strings of an initialized display.
    pub fn query(
        egl: &Egl,
        display: egl::Display,
        device_count: usize,
        egl_version: (i32, i32),
    ) -> Self {
        let query = |name| {
            egl.query_string(Some(display), name)
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|e| format!("<unavailable: {e}>"))
        };

        Self {
            device_count,
            egl_version,
            client_apis: query(egl::CLIENT_APIS),
            vendor: query(egl::VENDOR),
            version: query(egl::VERSION),
        }
    }

    /// Log the platform strings.
    pub fn log(&self) {
        tracing::info!("EGL info:");
        tracing::info!("   APIs: {}", self.client_apis);
        tracing::info!(" Vendor: {}", self.vendor);
        tracing::info!("Version: {}", self.version);
    }
}

/// Strings and extensions of the current GL context.
#[derive(Debug, Clone)]
pub struct GlInfo {
    /// GPU vendor
    pub vendor: GpuVendor,
    /// Raw vendor string
    pub vendor_name: String,
    /// Renderer string
    pub renderer: String,
    /// Version string
    pub version: String,
    /// Available extensions
    pub extensions: HashSet<String>,
}

impl GlInfo {
    /// Query the current context.
    ///
    /// # Safety
    /// The context `gl` was loaded from must be current.
    pub unsafe fn query(gl: &GlFunctions) -> Self {
        let (vendor_name, renderer, version, extensions) = unsafe {
            (
                gl.string(gl::VENDOR),
                gl.string(gl::RENDERER),
                gl.string(gl::VERSION),
                gl.extensions(),
            )
        };

        Self {
            vendor: GpuVendor::from_vendor_string(&vendor_name),
            vendor_name,
            renderer,
            version,
            extensions: extensions.into_iter().collect(),
        }
    }

    /// Whether an extension is exposed
    pub fn supports(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Sparse extensions this context does not list
    pub fn missing_extensions(&self) -> Vec<&'static str> {
        SPARSE_EXTENSIONS
            .into_iter()
            .filter(|ext| !self.supports(ext))
            .collect()
    }

    /// Warn about unlisted sparse extensions.
    ///
    /// Returns how many were missing.
    pub fn warn_missing_extensions(&self) -> usize {
        let missing = self.missing_extensions();
        for ext in &missing {
            tracing::warn!("{ext} not listed by the driver");
        }
        missing.len()
    }

    /// Get a human-readable summary of capabilities.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}) - OpenGL {} - {} extensions",
            self.renderer,
            self.vendor,
            self.version,
            self.extensions.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(extensions: &[&str]) -> GlInfo {
        GlInfo {
            vendor: GpuVendor::Nvidia,
            vendor_name: "NVIDIA Corporation".into(),
            renderer: "NVIDIA GeForce RTX 3080/PCIe/SSE2".into(),
            version: "4.6.0 NVIDIA 535.54.03".into(),
            extensions: extensions.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn vendor_identification() {
        assert_eq!(GpuVendor::from_vendor_string("NVIDIA Corporation"), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_string("AMD"), GpuVendor::Amd);
        assert_eq!(
            GpuVendor::from_vendor_string("ATI Technologies Inc."),
            GpuVendor::Amd
        );
        assert_eq!(GpuVendor::from_vendor_string("Intel"), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_string("Mesa/X.org"), GpuVendor::Mesa);
        assert_eq!(GpuVendor::from_vendor_string("Imagination"), GpuVendor::Other);
    }

    #[test]
    fn missing_sparse_extensions_are_listed() {
        let full = info(&["GL_ARB_sparse_texture", "GL_EXT_direct_state_access"]);
        assert!(full.missing_extensions().is_empty());
        assert_eq!(full.warn_missing_extensions(), 0);

        assert_eq!(info(&[]).missing_extensions().len(), 2);
    }

    #[test]
    fn core_profile_without_dsa_only_warns() {
        let mut mesa = info(&["GL_ARB_sparse_texture", "GL_ARB_sparse_texture2"]);
        mesa.vendor = GpuVendor::Mesa;
        mesa.version = "4.6 (Core Profile) Mesa 24.0.5".into();

        assert_eq!(mesa.missing_extensions(), ["GL_EXT_direct_state_access"]);
        assert_eq!(mesa.warn_missing_extensions(), 1);
    }

    #[test]
    fn summary_mentions_renderer() {
        let summary = info(&["GL_ARB_sparse_texture"]).summary();
        assert!(summary.starts_with("NVIDIA GeForce RTX 3080/PCIe/SSE2 (Nvidia)"));
        assert!(summary.ends_with("1 extensions"));
    }
}
