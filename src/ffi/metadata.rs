//! Block, datum and iterator handles for the Exif, IPTC and XMP domains.
//!
//! The three domains share one implementation: generic helpers over
//! [`MetadataBlock`], stamped out per domain by `export_domain!` with the
//! exact C symbol names.

use std::ffi::{c_char, c_int};
use std::sync::Arc;

use super::{Exiv2Error, Exiv2Image, free_handle, guard, into_handle, malloc_string, shield, str_arg};
use crate::error::Error;
use crate::exif::{ExifData, Exifdatum};
use crate::image::Image;
use crate::iptc::{IptcData, Iptcdatum};
use crate::iter::{DatumIter, MetadataBlock, Metadatum};
use crate::xmp::{XmpData, Xmpdatum};

/// Snapshot of one domain's entries, taken when the handle was created.
pub struct Block<B> {
    data: Arc<B>,
}

/// One entry, owned by the handle.
pub struct Datum<D> {
    datum: D,
}

/// Forward cursor over a [`Block`].
pub struct DatumCursor<B> {
    inner: DatumIter<B>,
}

pub type Exiv2ExifData = Block<ExifData>;
pub type Exiv2ExifDatum = Datum<Exifdatum>;
pub type Exiv2ExifDatumIterator = DatumCursor<ExifData>;
pub type Exiv2IptcData = Block<IptcData>;
pub type Exiv2IptcDatum = Datum<Iptcdatum>;
pub type Exiv2IptcDatumIterator = DatumCursor<IptcData>;
pub type Exiv2XmpData = Block<XmpData>;
pub type Exiv2XmpDatum = Datum<Xmpdatum>;
pub type Exiv2XmpDatumIterator = DatumCursor<XmpData>;

unsafe fn get_data<B: Clone>(img: *const Exiv2Image, select: fn(&Image) -> &B) -> *mut Block<B> {
    // SAFETY: caller guarantees `img` is null or live.
    let Some(img) = (unsafe { img.as_ref() }) else {
        return std::ptr::null_mut();
    };
    shield(std::ptr::null_mut(), || {
        into_handle(Block {
            data: Arc::new(select(&img.image).clone()),
        })
    })
}

unsafe fn find_key<B: MetadataBlock>(
    block: *const Block<B>,
    key: *const c_char,
    error: *mut *mut Exiv2Error,
) -> *mut Datum<B::Datum> {
    // SAFETY: forwarded caller guarantees.
    unsafe {
        guard(error, std::ptr::null_mut(), || {
            let block = block.as_ref().ok_or_else(|| Error::General("data is null".to_string()))?;
            let key = str_arg(key, "key")?;
            Ok(block
                .data
                .find_key(key)?
                .map_or(std::ptr::null_mut(), |d| into_handle(Datum { datum: d.clone() })))
        })
    }
}

unsafe fn iterator<B: MetadataBlock>(block: *const Block<B>) -> *mut DatumCursor<B> {
    // SAFETY: caller guarantees `block` is null or live.
    unsafe { block.as_ref() }.map_or(std::ptr::null_mut(), |block| {
        into_handle(DatumCursor {
            inner: DatumIter::new(Arc::clone(&block.data)),
        })
    })
}

unsafe fn has_next<B: MetadataBlock>(iter: *const DatumCursor<B>) -> c_int {
    // SAFETY: caller guarantees `iter` is null or live.
    unsafe { iter.as_ref() }.map_or(0, |iter| c_int::from(iter.inner.has_next()))
}

unsafe fn next<B: MetadataBlock>(iter: *mut DatumCursor<B>) -> *mut Datum<B::Datum> {
    // SAFETY: caller guarantees `iter` is null or live and unaliased.
    let Some(iter) = (unsafe { iter.as_mut() }) else {
        return std::ptr::null_mut();
    };
    shield(std::ptr::null_mut(), || {
        iter.inner
            .next()
            .map_or(std::ptr::null_mut(), |datum| into_handle(Datum { datum }))
    })
}

unsafe fn datum_key<D: Metadatum>(datum: *const Datum<D>) -> *const c_char {
    // SAFETY: caller guarantees `datum` is null or live.
    let Some(datum) = (unsafe { datum.as_ref() }) else {
        return std::ptr::null();
    };
    shield(std::ptr::null(), || malloc_string(&datum.datum.key()))
}

unsafe fn datum_to_string<D: Metadatum>(datum: *const Datum<D>) -> *const c_char {
    // SAFETY: caller guarantees `datum` is null or live.
    let Some(datum) = (unsafe { datum.as_ref() }) else {
        return std::ptr::null();
    };
    shield(std::ptr::null(), || malloc_string(&datum.datum.render()))
}

macro_rules! export_domain {
    (
        $block:ty, $datum:ty, $cursor:ty, $select:expr;
        $get:ident, $find:ident, $data_free:ident,
        $iterator:ident, $has_next:ident, $next:ident, $iter_free:ident,
        $key:ident, $to_string:ident, $datum_free:ident $(,)?
    ) => {
        /// Snapshot the image's current entries. Null only for a null image.
        ///
        /// # Safety
        /// `img` must be null or a live image handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $get(img: *const Exiv2Image) -> *mut $block {
            // SAFETY: forwarded caller guarantees.
            unsafe { get_data(img, $select) }
        }

        /// Exact-key lookup. Null with no error when the key is absent;
        /// null with an error when the key is malformed.
        ///
        /// # Safety
        /// `data` must be null or live; `key` must be null or NUL-terminated;
        /// `error` must be null or writable.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $find(
            data: *const $block,
            key: *const c_char,
            error: *mut *mut Exiv2Error,
        ) -> *mut $datum {
            // SAFETY: forwarded caller guarantees.
            unsafe { find_key(data, key, error) }
        }

        /// # Safety
        /// `data` must be null or a live handle not used after this call.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $data_free(data: *mut $block) {
            // SAFETY: forwarded caller guarantees.
            unsafe { free_handle(data) }
        }

        /// # Safety
        /// `data` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $iterator(data: *const $block) -> *mut $cursor {
            // SAFETY: forwarded caller guarantees.
            unsafe { iterator(data) }
        }

        /// 1 while entries remain, 0 once exhausted.
        ///
        /// # Safety
        /// `iter` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $has_next(iter: *const $cursor) -> c_int {
            // SAFETY: forwarded caller guarantees.
            unsafe { has_next(iter) }
        }

        /// The current entry, or null once exhausted.
        ///
        /// # Safety
        /// `iter` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $next(iter: *mut $cursor) -> *mut $datum {
            // SAFETY: forwarded caller guarantees.
            unsafe { next(iter) }
        }

        /// # Safety
        /// `iter` must be null or a live handle not used after this call.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $iter_free(iter: *mut $cursor) {
            // SAFETY: forwarded caller guarantees.
            unsafe { free_handle(iter) }
        }

        /// The entry's key. Release with `free()` or `exiv2_string_free`.
        ///
        /// # Safety
        /// `datum` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $key(datum: *const $datum) -> *const c_char {
            // SAFETY: forwarded caller guarantees.
            unsafe { datum_key(datum) }
        }

        /// The entry's value as text. Release with `free()` or `exiv2_string_free`.
        ///
        /// # Safety
        /// `datum` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $to_string(datum: *const $datum) -> *const c_char {
            // SAFETY: forwarded caller guarantees.
            unsafe { datum_to_string(datum) }
        }

        /// # Safety
        /// `datum` must be null or a live handle not used after this call.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $datum_free(datum: *mut $datum) {
            // SAFETY: forwarded caller guarantees.
            unsafe { free_handle(datum) }
        }
    };
}

export_domain! {
    Exiv2ExifData, Exiv2ExifDatum, Exiv2ExifDatumIterator, Image::exif_data;
    exiv2_image_get_exif_data, exiv2_exif_data_find_key, exiv2_exif_data_free,
    exiv2_exif_data_iterator, exiv2_exif_data_iterator_has_next,
    exiv2_exif_datum_iterator_next, exiv2_exif_datum_iterator_free,
    exiv2_exif_datum_key, exiv2_exif_datum_to_string, exiv2_exif_datum_free,
}

export_domain! {
    Exiv2IptcData, Exiv2IptcDatum, Exiv2IptcDatumIterator, Image::iptc_data;
    exiv2_image_get_iptc_data, exiv2_iptc_data_find_key, exiv2_iptc_data_free,
    exiv2_iptc_data_iterator, exiv2_iptc_data_iterator_has_next,
    exiv2_iptc_datum_iterator_next, exiv2_iptc_datum_iterator_free,
    exiv2_iptc_datum_key, exiv2_iptc_datum_to_string, exiv2_iptc_datum_free,
}

export_domain! {
    Exiv2XmpData, Exiv2XmpDatum, Exiv2XmpDatumIterator, Image::xmp_data;
    exiv2_image_get_xmp_data, exiv2_xmp_data_find_key, exiv2_xmp_data_free,
    exiv2_xmp_data_iterator, exiv2_xmp_data_iterator_has_next,
    exiv2_xmp_datum_iterator_next, exiv2_xmp_datum_iterator_free,
    exiv2_xmp_datum_key, exiv2_xmp_datum_to_string, exiv2_xmp_datum_free,
}

/// XMP value type name: `XmpText`, `XmpBag`, `XmpSeq`, `XmpAlt` or `LangAlt`.
/// Release with `free()` or `exiv2_string_free`.
///
/// # Safety
/// `datum` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_xmp_datum_type(datum: *const Exiv2XmpDatum) -> *const c_char {
    // SAFETY: caller guarantees `datum` is null or live.
    unsafe { datum.as_ref() }.map_or(std::ptr::null(), |d| malloc_string(d.datum.type_name()))
}
