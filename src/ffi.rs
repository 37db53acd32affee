//! C-ABI FFI bindings for cross-language integration.
//!
//! This module provides a C-compatible API for using pdfsqueeze from other
//! languages such as C#, Python, and Node.js.

use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::slice;

use crate::{compress_bytes, detect_format_from_path};

/// Buffer returned by [`pdfsqueeze_compress`].
#[repr(C)]
pub struct PdfsqueezeBuffer {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Output bytes (null if failed). Must be freed with `pdfsqueeze_free_buffer`.
    pub data: *mut u8,
    /// Length of `data` in bytes.
    pub len: usize,
    /// Error message (null if succeeded). Must be freed with `pdfsqueeze_free_buffer`.
    pub error: *mut c_char,
}

impl PdfsqueezeBuffer {
    fn success(data: Vec<u8>) -> Self {
        let boxed = data.into_boxed_slice();
        let len = boxed.len();
        Self {
            success: true,
            data: Box::into_raw(boxed) as *mut u8,
            len,
            error: ptr::null_mut(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: ptr::null_mut(),
            len: 0,
            error: CString::new(message).unwrap_or_default().into_raw(),
        }
    }
}

/// Compress an in-memory PDF to at most `target_kb` KiB where possible.
///
/// # Safety
///
/// `data` must point to `len` readable bytes.
/// The returned buffer must be freed with `pdfsqueeze_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn pdfsqueeze_compress(
    data: *const u8,
    len: usize,
    target_kb: u32,
) -> PdfsqueezeBuffer {
    if data.is_null() {
        return PdfsqueezeBuffer::error("Data cannot be null".to_string());
    }

    let input = slice::from_raw_parts(data, len);
    match compress_bytes(input, target_kb) {
        Ok(output) => PdfsqueezeBuffer::success(output),
        Err(e) => PdfsqueezeBuffer::error(e.to_string()),
    }
}

/// Check if a file starts with a PDF header.
///
/// # Safety
///
/// The `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn pdfsqueeze_is_pdf(path: *const c_char) -> bool {
    if path.is_null() {
        return false;
    }

    let path_str = match CStr::from_ptr(path).to_str() {
        Ok(s) => s,
        Err(_) => return false,
    };

    detect_format_from_path(path_str).is_ok()
}

/// Free a buffer returned by `pdfsqueeze_compress`.
///
/// # Safety
///
/// The `buffer` must have been returned by a pdfsqueeze function.
/// This function should only be called once per buffer.
#[no_mangle]
pub unsafe extern "C" fn pdfsqueeze_free_buffer(buffer: PdfsqueezeBuffer) {
    if !buffer.data.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            buffer.data,
            buffer.len,
        )));
    }
    if !buffer.error.is_null() {
        drop(CString::from_raw(buffer.error));
    }
}
