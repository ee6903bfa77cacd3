//! C-compatible FFI for the geometry engine.
//!
//! These functions provide a minimal handle-based interface that can be
//! consumed from C or other languages that interoperate with a `cdylib`.
//!
//! The API follows a status-code pattern: `0` indicates success, negative
//! numbers indicate errors, and positive numbers are reserved for
//! non-error states such as an unsupported operation.

use crate::{Factory, Geometry};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

/// Generic success status.
const GEOFORGE_OK: c_int = 0;
/// Returned when the provided arguments are null or otherwise invalid.
const GEOFORGE_ERR_INVALID_ARGUMENT: c_int = -1;
/// Returned when an internal geometry operation fails.
const GEOFORGE_ERR_OPERATION_FAILED: c_int = -2;
/// Returned when the native provider does not support the operation.
pub const GEOFORGE_STATUS_UNSUPPORTED: c_int = 1;

/// Opaque factory handle exposed to C callers.
#[repr(C)]
pub struct GeoforgeFactory {
    factory: Factory,
}

/// Opaque geometry handle exposed to C callers.
#[repr(C)]
pub struct GeoforgeGeometry {
    geometry: Geometry,
}

#[unsafe(no_mangle)]
pub extern "C" fn geoforge_factory_new(srid: c_int) -> *mut GeoforgeFactory {
    let factory = Factory::builder().srid(srid).build();
    Box::into_raw(Box::new(GeoforgeFactory { factory }))
}

/// # Safety
/// `factory` must be a valid pointer obtained from `geoforge_factory_new`
/// and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geoforge_factory_free(factory: *mut GeoforgeFactory) {
    if factory.is_null() {
        return;
    }
    // Reconstruct the Box so it is dropped at the end of the scope.
    unsafe {
        drop(Box::from_raw(factory));
    }
}

/// # Safety
/// `factory` must be valid. `wkt` must point to a valid, null-terminated
/// UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geoforge_parse_wkt(
    factory: *mut GeoforgeFactory,
    wkt: *const c_char,
) -> *mut GeoforgeGeometry {
    if factory.is_null() || wkt.is_null() {
        return ptr::null_mut();
    }

    let text = match unsafe { CStr::from_ptr(wkt) }.to_str() {
        Ok(text) => text,
        Err(_) => return ptr::null_mut(),
    };

    let factory = unsafe { &(*factory).factory };
    match factory.parse_wkt(text) {
        Ok(geometry) => Box::into_raw(Box::new(GeoforgeGeometry { geometry })),
        Err(_) => ptr::null_mut(),
    }
}

/// # Safety
/// `geometry` must be a valid pointer obtained from this module and not
/// yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geoforge_geometry_free(geometry: *mut GeoforgeGeometry) {
    if geometry.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(geometry));
    }
}

/// Writes the geometry's WKT form into `text_out` as a heap-allocated
/// string. Free it with `geoforge_string_free`.
///
/// # Safety
/// `geometry` and `text_out` must be valid pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geoforge_geometry_as_text(
    geometry: *mut GeoforgeGeometry,
    text_out: *mut *mut c_char,
) -> c_int {
    if geometry.is_null() || text_out.is_null() {
        return GEOFORGE_ERR_INVALID_ARGUMENT;
    }

    let geometry = unsafe { &(*geometry).geometry };
    let text = match geometry.as_text() {
        Ok(Some(text)) => text,
        Ok(None) => return GEOFORGE_STATUS_UNSUPPORTED,
        Err(_) => return GEOFORGE_ERR_OPERATION_FAILED,
    };

    match CString::new(text) {
        Ok(cstring) => {
            unsafe {
                *text_out = cstring.into_raw();
            }
            GEOFORGE_OK
        }
        Err(_) => GEOFORGE_ERR_OPERATION_FAILED,
    }
}

/// # Safety
/// `text` must be a value previously produced by
/// `geoforge_geometry_as_text` and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geoforge_string_free(text: *mut c_char) {
    if text.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(text));
    }
}

/// Returns `1` when the geometries intersect, `0` when they do not, and
/// a negative status on error.
///
/// # Safety
/// `a` and `b` must be valid pointers obtained from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn geoforge_geometry_intersects(
    a: *mut GeoforgeGeometry,
    b: *mut GeoforgeGeometry,
) -> c_int {
    if a.is_null() || b.is_null() {
        return GEOFORGE_ERR_INVALID_ARGUMENT;
    }

    let a = unsafe { &(*a).geometry };
    let b = unsafe { &(*b).geometry };
    match a.intersects(b) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => GEOFORGE_ERR_OPERATION_FAILED,
    }
}
