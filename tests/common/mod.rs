//! Shared fixtures for integration tests.
//!
//! Images are generated at test time: pixels from the `image` crate, Exif
//! blocks from `little_exif`, IPTC and XMP segments assembled by hand.

#![allow(dead_code)]

use std::ffi::{CStr, CString, c_char};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exiv_bridge::ffi::*;
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::{Png, PngChunk};
use img_parts::{Bytes, ImageEXIF};
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use tempfile::TempDir;

pub const MAKE: &str = "FakeMake";
pub const MODEL: &str = "FakeModel";

// little_exif JPEG output: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
const JPEG_EXIF_OVERHEAD: usize = 10;

const MARKER_APP1: u8 = 0xE1;
const MARKER_APP13: u8 = 0xED;

pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = ::image::RgbImage::from_pixel(width, height, ::image::Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ::image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

pub fn plain_png(width: u32, height: u32) -> Vec<u8> {
    let img = ::image::RgbImage::from_pixel(width, height, ::image::Rgb([0, 200, 0]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// TIFF block carrying Make and Model, as little_exif writes it.
fn camera_tiff() -> Vec<u8> {
    let mut metadata = Metadata::new();
    metadata.set_tag(ExifTag::Make(MAKE.to_string()));
    metadata.set_tag(ExifTag::Model(MODEL.to_string()));
    let bytes = metadata.as_u8_vec(FileExtension::JPEG);
    bytes[JPEG_EXIF_OVERHEAD..].to_vec()
}

/// A JPEG whose Exif names [`MAKE`] and [`MODEL`].
pub fn camera_jpeg() -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(plain_jpeg(16, 8))).unwrap();
    jpeg.set_exif(Some(Bytes::from(camera_tiff())));
    jpeg.encoder().bytes().to_vec()
}

/// A JPEG whose Exif APP1 holds a TIFF header pointing IFD0 past the end.
pub fn corrupt_exif_jpeg() -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(plain_jpeg(16, 8))).unwrap();
    jpeg.set_exif(Some(Bytes::from_static(b"II\x2a\0\xff\0\0\0")));
    jpeg.encoder().bytes().to_vec()
}

/// A PNG with [`MAKE`]/[`MODEL`] Exif and an iCCP chunk whose profile name
/// is never NUL-terminated.
pub fn broken_icc_png() -> Vec<u8> {
    let mut png = Png::from_bytes(Bytes::from(plain_png(4, 4))).unwrap();
    png.set_exif(Some(Bytes::from(camera_tiff())));
    // Right after IHDR, where iCCP belongs.
    png.chunks_mut()
        .insert(1, PngChunk::new(*b"iCCP", Bytes::from_static(b"abc")));
    png.encoder().bytes().to_vec()
}

/// Photoshop APP13 payload holding one IIM block.
fn app13(iim: &[u8]) -> Vec<u8> {
    let mut out = b"Photoshop 3.0\0".to_vec();
    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(&0x0404u16.to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&(iim.len() as u32).to_be_bytes());
    out.extend_from_slice(iim);
    if iim.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn dataset(record: u8, number: u8, data: &str) -> Vec<u8> {
    let mut out = vec![0x1C, record, number];
    out.extend_from_slice(&(data.len() as u16).to_be_bytes());
    out.extend_from_slice(data.as_bytes());
    out
}

pub const XMP_PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    xmp:Rating="4">
   <dc:subject>
    <rdf:Bag>
     <rdf:li>harbour</rdf:li>
     <rdf:li>boats</rdf:li>
     <rdf:li>dusk</rdf:li>
    </rdf:Bag>
   </dc:subject>
   <dc:creator>
    <rdf:Seq>
     <rdf:li>Jane Doe</rdf:li>
     <rdf:li>John Roe</rdf:li>
    </rdf:Seq>
   </dc:creator>
   <dc:title>
    <rdf:Alt>
     <rdf:li xml:lang="de-DE">Hafen</rdf:li>
     <rdf:li xml:lang="x-default">Harbour</rdf:li>
    </rdf:Alt>
   </dc:title>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

/// [`camera_jpeg`] plus an IPTC block (caption and two keywords) and an XMP packet.
pub fn full_jpeg() -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(camera_jpeg())).unwrap();

    let mut iim = dataset(2, 120, "Boats at dusk");
    iim.extend(dataset(2, 25, "harbour"));
    iim.extend(dataset(2, 25, "boats"));

    let mut xmp = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    xmp.extend_from_slice(XMP_PACKET.as_bytes());

    let segments = jpeg.segments_mut();
    let at = segments.iter().take_while(|s| s.marker() != MARKER_APP1).count() + 1;
    let at = at.min(segments.len());
    segments.insert(at, JpegSegment::new_with_contents(MARKER_APP1, Bytes::from(xmp)));
    segments.insert(at + 1, JpegSegment::new_with_contents(MARKER_APP13, Bytes::from(app13(&iim))));
    jpeg.encoder().bytes().to_vec()
}

pub fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn c_path(path: &Path) -> CString {
    CString::new(path.to_str().unwrap()).unwrap()
}

/// Copy a library-allocated string and release it.
///
/// # Safety
/// `s` must be a non-null string returned by the library.
pub unsafe fn take_string(s: *const c_char) -> String {
    assert!(!s.is_null());
    unsafe {
        let out = CStr::from_ptr(s).to_str().unwrap().to_string();
        exiv2_string_free(s);
        out
    }
}

/// Open `path` through the C surface and read its metadata, panicking on error.
pub fn open_read(path: &Path) -> *mut Exiv2Image {
    let path = c_path(path);
    let mut err: *mut Exiv2Error = std::ptr::null_mut();
    unsafe {
        let img = exiv2_image_factory_open(path.as_ptr(), &mut err);
        assert!(err.is_null() && !img.is_null(), "open failed");
        exiv2_image_read_metadata(img, &mut err);
        assert!(err.is_null(), "read_metadata failed");
        img
    }
}

/// Value of `key` in the image's Exif, through the C surface.
pub fn exif_value(img: *mut Exiv2Image, key: &str) -> Option<String> {
    let key = CString::new(key).unwrap();
    unsafe {
        let data = exiv2_image_get_exif_data(img);
        let datum = exiv2_exif_data_find_key(data, key.as_ptr(), std::ptr::null_mut());
        let out = (!datum.is_null()).then(|| take_string(exiv2_exif_datum_to_string(datum)));
        exiv2_exif_datum_free(datum);
        exiv2_exif_data_free(data);
        out
    }
}

/// Value of `key` in the image's IPTC, through the C surface.
pub fn iptc_value(img: *mut Exiv2Image, key: &str) -> Option<String> {
    let key = CString::new(key).unwrap();
    unsafe {
        let data = exiv2_image_get_iptc_data(img);
        let datum = exiv2_iptc_data_find_key(data, key.as_ptr(), std::ptr::null_mut());
        let out = (!datum.is_null()).then(|| take_string(exiv2_iptc_datum_to_string(datum)));
        exiv2_iptc_datum_free(datum);
        exiv2_iptc_data_free(data);
        out
    }
}
