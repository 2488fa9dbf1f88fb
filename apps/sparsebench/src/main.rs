//! Sparse texture page commitment benchmark
//!
//! Creates an offscreen OpenGL 4.6 core context on EGL device 0, allocates a
//! 32768x32768 sparse RGBA8 texture array and walks every page tile of the
//! first four mip levels twice: once committing memory and uploading a
//! uniform color per tile, once evicting it. Every page-commitment call is
//! timed on its own; the pass totals are measured at the pass boundaries.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -p sparsebench
//! ```
//!
//! ## Output
//!
//! Everything goes to standard error: setup diagnostics, one
//! `TIME COMMIT|EVICT <ms>ms | <tile w> <tile h> | <level>` line per call,
//! then the totals.
//!
//! ## Exit codes
//!
//! - `0`: both passes completed
//! - `1`: setup failed (no device, context or texture creation)
//! - `2`: the driver raised an error during a pass
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use std::error::Error as _;
use std::io;
use std::process::ExitCode;

use anyhow::Context as _;
use sparsebench_core::{execute, BenchConfig};
use sparsebench_gpu::{GlSparseTexture, GpuContextBuilder, TextureDesc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BenchConfig::default();
    info!(
        size = config.base_size,
        levels = config.max_levels,
        "Sparse texture commitment benchmark"
    );

    let mut out = io::stderr().lock();
    match execute(&config, bootstrap, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::from(err.exit_code())
        }
    }
}

/// Create the offscreen context and hand it to a freshly allocated sparse texture.
fn bootstrap(config: &BenchConfig) -> anyhow::Result<GlSparseTexture> {
    let context = GpuContextBuilder::new()
        .build()
        .context("Failed to create offscreen GL context")?;

    let texture = GlSparseTexture::create(context, &TextureDesc::from_config(config))
        .context("Failed to create sparse texture")?;

    Ok(texture)
}
