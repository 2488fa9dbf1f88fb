//! EGL loading, device enumeration and display creation.

use std::ffi::c_void;
use std::ptr;

use khronos_egl as egl;

use crate::error::{GpuError, Result};

/// Runtime-loaded EGL entry points.
pub type Egl = egl::DynamicInstance<egl::EGL1_4>;

// EGL_EXT_platform_device
const PLATFORM_DEVICE_EXT: egl::Enum = 0x313F;

type QueryDevicesFn =
    unsafe extern "system" fn(egl::Int, *mut *mut c_void, *mut egl::Int) -> egl::Boolean;
type GetPlatformDisplayFn =
    unsafe extern "system" fn(egl::Enum, *mut c_void, *const egl::Int) -> *mut c_void;

/// Opaque handle of an EGL device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EglDevice(*mut c_void);

/// Load the system EGL library.
pub fn load_egl() -> Result<Egl> {
    // SAFETY: loading libEGL runs no initialization beyond the dynamic loader's.
    unsafe { Egl::load_required() }.map_err(|e| GpuError::EglLoad(e.to_string()))
}

/// Resolve an EGL extension entry point.
fn extension_proc(egl: &Egl, name: &'static str) -> Result<extern "system" fn()> {
    egl.get_proc_address(name).ok_or(GpuError::FunctionLoad(name))
}

/// List the devices exposed through `EGL_EXT_device_enumeration`.
///
/// An empty list is an error: there is nothing to bind a display to.
pub fn enumerate_devices(egl: &Egl) -> Result<Vec<EglDevice>> {
    let proc = extension_proc(egl, "eglQueryDevicesEXT")?;
    // SAFETY: eglQueryDevicesEXT has exactly this signature.
    let query_devices = unsafe { std::mem::transmute::<extern "system" fn(), QueryDevicesFn>(proc) };

    let mut count: egl::Int = 0;
    // SAFETY: a null device array with max 0 only queries the count.
    if unsafe { query_devices(0, ptr::null_mut(), &mut count) } == egl::FALSE {
        return Err(query_error(egl, "eglQueryDevicesEXT"));
    }

    tracing::info!("device count: {count}");
    if count <= 0 {
        return Err(GpuError::NoDevices);
    }

    let mut devices = vec![ptr::null_mut(); count as usize];
    let mut found: egl::Int = 0;
    // SAFETY: `devices` holds `count` writable slots.
    if unsafe { query_devices(count, devices.as_mut_ptr(), &mut found) } == egl::FALSE {
        return Err(query_error(egl, "eglQueryDevicesEXT"));
    }
    devices.truncate(found.max(0) as usize);

    if devices.is_empty() {
        return Err(GpuError::NoDevices);
    }

    Ok(devices.into_iter().map(EglDevice).collect())
}

/// Open and initialize the platform display bound to `device`.
///
/// Returns the display with the EGL version it reports.
pub fn open_device_display(
    egl: &Egl,
    device: EglDevice,
    index: usize,
) -> Result<(egl::Display, (egl::Int, egl::Int))> {
    let proc = extension_proc(egl, "eglGetPlatformDisplayEXT")?;
    // SAFETY: eglGetPlatformDisplayEXT has exactly this signature.
    let get_platform_display =
        unsafe { std::mem::transmute::<extern "system" fn(), GetPlatformDisplayFn>(proc) };

    // SAFETY: `device` came from eglQueryDevicesEXT; a null attribute list is allowed.
    let raw = unsafe { get_platform_display(PLATFORM_DEVICE_EXT, device.0, ptr::null()) };
    if raw.is_null() {
        return Err(GpuError::NoDisplay(index));
    }
    tracing::debug!("display: {raw:p}");

    // SAFETY: `raw` is a display handle returned by the driver.
    let display = unsafe { egl::Display::from_ptr(raw) };
    let version = egl
        .initialize(display)
        .map_err(GpuError::egl("eglInitialize"))?;
    tracing::info!("EGL {}.{} initialized", version.0, version.1);

    Ok((display, version))
}

fn query_error(egl: &Egl, call: &'static str) -> GpuError {
    call_failure(call, egl.get_error())
}

fn call_failure(call: &'static str, pending: Option<egl::Error>) -> GpuError {
    pending.map_or(GpuError::EglCallFailed(call), |source| GpuError::Egl { call, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_call_keeps_pending_egl_error() {
        match call_failure("eglQueryDevicesEXT", Some(egl::Error::BadParameter)) {
            GpuError::Egl { call, source } => {
                assert_eq!(call, "eglQueryDevicesEXT");
                assert_eq!(source, egl::Error::BadParameter);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_call_without_egl_error_names_the_call() {
        let err = call_failure("eglQueryDevicesEXT", None);
        assert!(matches!(err, GpuError::EglCallFailed("eglQueryDevicesEXT")));
        assert_eq!(err.to_string(), "eglQueryDevicesEXT failed without an EGL error");
    }
}
