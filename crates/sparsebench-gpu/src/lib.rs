//! Offscreen EGL/OpenGL layer for the sparse texture commitment benchmark.
//!
//! This crate provides:
//! - EGL device enumeration and display initialization
//! - Offscreen (pbuffer) GL core context creation
//! - Runtime-resolved GL function table
//! - Platform and extension capability detection
//! - A sparse texture implementing [`sparsebench_core::SparseTexture`]

pub mod capabilities;
pub mod context;
pub mod display;
pub mod error;
pub mod gl;
pub mod texture;

pub use capabilities::{GlInfo, GpuVendor, PlatformInfo, SPARSE_EXTENSIONS};
pub use context::{GpuContext, GpuContextBuilder};
pub use display::{EglDevice, Egl};
pub use error::{GpuError, Result};
pub use gl::{GlError, GlFunctions};
pub use texture::{GlSparseTexture, TextureDesc};
