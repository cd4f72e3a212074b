use std::ffi::{c_char, c_int, c_long};

use super::{Exiv2Error, free_handle, guard, handle_mut, into_handle, shield, str_arg};
use crate::config::Config;
use crate::error::Error;
use crate::image::Image;

/// Opaque image handle.
pub struct Exiv2Image {
    pub(crate) image: Image,
}

/// Open an image file. Returns null on failure.
///
/// # Safety
/// `path` must be null or NUL-terminated; `error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_factory_open(path: *const c_char, error: *mut *mut Exiv2Error) -> *mut Exiv2Image {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, std::ptr::null_mut(), || {
            let path = str_arg(path, "path")?;
            let image = Image::open(path)?;
            Ok(into_handle(Exiv2Image { image }))
        })
    }
}

/// Open an image file with a JSON configuration (see [`Config`]).
/// A null `config_json` uses the defaults.
///
/// # Safety
/// `path` and `config_json` must be null or NUL-terminated; `error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_factory_open_with_config(
    path: *const c_char,
    config_json: *const c_char,
    error: *mut *mut Exiv2Error,
) -> *mut Exiv2Image {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, std::ptr::null_mut(), || {
            let path = str_arg(path, "path")?;
            let config = if config_json.is_null() {
                Config::default()
            } else {
                Config::from_json(str_arg(config_json, "config")?)?
            };
            let image = Image::open_with_config(path, config)?;
            Ok(into_handle(Exiv2Image { image }))
        })
    }
}

/// Open an image from memory. The bytes are copied before this returns.
///
/// # Safety
/// `bytes` must be null or valid for `size` reads; `error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_factory_open_bytes(
    bytes: *const u8,
    size: c_long,
    error: *mut *mut Exiv2Error,
) -> *mut Exiv2Image {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, std::ptr::null_mut(), || {
            if bytes.is_null() || size <= 0 {
                log::debug!("open_bytes called with an empty buffer");
                return Err(Error::MemoryContainsUnknownImageType);
            }
            let data = std::slice::from_raw_parts(bytes, size as usize);
            let image = Image::open_bytes(data)?;
            Ok(into_handle(Exiv2Image { image }))
        })
    }
}

/// # Safety
/// `img` must be null or a live handle; `error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_read_metadata(img: *mut Exiv2Image, error: *mut *mut Exiv2Error) {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, (), || handle_mut(img, "image")?.image.read_metadata());
    }
}

/// Set an Exif tag to an ASCII value and write the image back.
///
/// # Safety
/// `img` must be null or a live handle; `key` and `value` must be null or
/// NUL-terminated; `error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_set_exif_string(
    img: *mut Exiv2Image,
    key: *const c_char,
    value: *const c_char,
    error: *mut *mut Exiv2Error,
) {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, (), || {
            let image = handle_mut(img, "image")?;
            image.image.set_exif_string(str_arg(key, "key")?, str_arg(value, "value")?)
        });
    }
}

/// Set an IPTC dataset to a string value and write the image back.
///
/// # Safety
/// Same contract as [`exiv2_image_set_exif_string`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_set_iptc_string(
    img: *mut Exiv2Image,
    key: *const c_char,
    value: *const c_char,
    error: *mut *mut Exiv2Error,
) {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, (), || {
            let image = handle_mut(img, "image")?;
            image.image.set_iptc_string(str_arg(key, "key")?, str_arg(value, "value")?)
        });
    }
}

/// Byte length of the image's current contents.
///
/// # Safety
/// `img` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv_image_get_size(img: *const Exiv2Image) -> c_long {
    // SAFETY: caller guarantees `img` is null or live.
    let Some(img) = (unsafe { img.as_ref() }) else {
        return 0;
    };
    shield(0, || img.image.io_size() as c_long)
}

/// The image's current bytes, borrowed until the next write-back or free.
///
/// # Safety
/// `img` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv_image_get_bytes_ptr(img: *const Exiv2Image) -> *const u8 {
    // SAFETY: caller guarantees `img` is null or live.
    let Some(img) = (unsafe { img.as_ref() }) else {
        return std::ptr::null();
    };
    img.image.io_bytes().as_ptr()
}

/// # Safety
/// `img` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_get_pixel_width(img: *const Exiv2Image) -> c_int {
    // SAFETY: caller guarantees `img` is null or live.
    unsafe { img.as_ref() }.map_or(0, |img| c_int::try_from(img.image.pixel_width()).unwrap_or(c_int::MAX))
}

/// # Safety
/// `img` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_get_pixel_height(img: *const Exiv2Image) -> c_int {
    // SAFETY: caller guarantees `img` is null or live.
    unsafe { img.as_ref() }.map_or(0, |img| c_int::try_from(img.image.pixel_height()).unwrap_or(c_int::MAX))
}

/// Embedded ICC profile, or null. Borrowed from the handle.
///
/// # Safety
/// `img` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_icc_profile(img: *const Exiv2Image) -> *const u8 {
    // SAFETY: caller guarantees `img` is null or live.
    unsafe { img.as_ref() }
        .and_then(|img| img.image.icc_profile())
        .map_or(std::ptr::null(), <[u8]>::as_ptr)
}

/// # Safety
/// `img` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_icc_profile_size(img: *const Exiv2Image) -> c_long {
    // SAFETY: caller guarantees `img` is null or live.
    unsafe { img.as_ref() }
        .and_then(|img| img.image.icc_profile())
        .map_or(0, |icc| icc.len() as c_long)
}

/// # Safety
/// `img` must be null or a live handle not used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_image_free(img: *mut Exiv2Image) {
    // SAFETY: forwarded caller guarantees.
    unsafe { free_handle(img) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn tiny_png() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        ::image::RgbImage::new(3, 2)
            .write_to(&mut out, ::image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    // ── opening ─────────────────────────────────────────────────────────

    #[test]
    fn open_bytes_reports_size_and_dimensions() {
        let png = tiny_png();
        let mut err: *mut Exiv2Error = std::ptr::null_mut();
        unsafe {
            let img = exiv2_image_factory_open_bytes(png.as_ptr(), png.len() as c_long, &mut err);
            assert!(!img.is_null());
            assert!(err.is_null());

            assert_eq!(exiv_image_get_size(img), png.len() as c_long);
            assert_eq!(exiv2_image_get_pixel_width(img), 0);

            exiv2_image_read_metadata(img, &mut err);
            assert!(err.is_null());
            assert_eq!(exiv2_image_get_pixel_width(img), 3);
            assert_eq!(exiv2_image_get_pixel_height(img), 2);
            assert!(exiv2_image_icc_profile(img).is_null());
            assert_eq!(exiv2_image_icc_profile_size(img), 0);

            let ptr = exiv_image_get_bytes_ptr(img);
            assert_eq!(std::slice::from_raw_parts(ptr, 8), &png[..8]);

            exiv2_image_free(img);
        }
    }

    #[test]
    fn empty_buffer_is_unknown_memory() {
        let mut err: *mut Exiv2Error = std::ptr::null_mut();
        unsafe {
            let img = exiv2_image_factory_open_bytes(std::ptr::null(), 0, &mut err);
            assert!(img.is_null());
            assert_eq!(super::super::exiv2_error_code(err), 12);
            super::super::exiv2_error_free(err);
        }
    }

    #[test]
    fn missing_file_fails_to_open() {
        let path = CString::new("/definitely/not/here.jpg").unwrap();
        let mut err: *mut Exiv2Error = std::ptr::null_mut();
        unsafe {
            let img = exiv2_image_factory_open(path.as_ptr(), &mut err);
            assert!(img.is_null());
            assert_eq!(super::super::exiv2_error_code(err), 9);
            super::super::exiv2_error_free(err);
        }
    }

    #[test]
    fn bad_config_json_is_general_error() {
        let path = CString::new("/tmp/whatever.jpg").unwrap();
        let config = CString::new("{ not json").unwrap();
        let mut err: *mut Exiv2Error = std::ptr::null_mut();
        unsafe {
            let img = exiv2_image_factory_open_with_config(path.as_ptr(), config.as_ptr(), &mut err);
            assert!(img.is_null());
            assert_eq!(super::super::exiv2_error_code(err), 1);
            super::super::exiv2_error_free(err);
        }
    }

    // ── null handles ────────────────────────────────────────────────────

    #[test]
    fn null_image_is_tolerated() {
        let mut err: *mut Exiv2Error = std::ptr::null_mut();
        unsafe {
            assert_eq!(exiv_image_get_size(std::ptr::null()), 0);
            assert!(exiv_image_get_bytes_ptr(std::ptr::null()).is_null());
            assert_eq!(exiv2_image_get_pixel_height(std::ptr::null()), 0);
            exiv2_image_free(std::ptr::null_mut());

            exiv2_image_read_metadata(std::ptr::null_mut(), &mut err);
            assert_eq!(super::super::exiv2_error_code(err), 1);
            super::super::exiv2_error_free(err);
        }
    }
}
