//! Locating and replacing metadata blocks inside image containers.
//!
//! JPEG, PNG and WebP go through `img-parts`, which keeps every segment or
//! chunk we do not touch byte-for-byte. TIFF files are their own Exif block,
//! so only reading is supported there.

use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF, ImageICC};

use super::ImageKind;
use crate::error::{Error, Result};
use crate::exif::{self, ExifGroup, ExifKey};
use crate::iptc::{self, PHOTOSHOP_HEADER};

const EXIF_PREFIX: &[u8] = b"Exif\0\0";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const PNG_XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp\0";

// A JPEG segment length is 16 bits and counts itself.
const MAX_SEGMENT_CONTENTS: usize = 0xFFFF - 2;

const MARKER_APP1: u8 = 0xE1;
const MARKER_APP13: u8 = 0xED;

/// Raw metadata blocks found in a container.
#[derive(Debug, Default)]
pub(crate) struct RawMetadata {
    /// TIFF structure, without the `Exif\0\0` prefix.
    pub exif: Option<Vec<u8>>,
    /// IPTC-IIM stream.
    pub iim: Option<Vec<u8>>,
    /// Serialized XMP packet.
    pub xmp: Option<Vec<u8>>,
    pub icc: Option<Vec<u8>>,
}

/// Blocks to replace on write. `None` leaves a block alone; an empty vector
/// removes it.
#[derive(Debug, Default)]
pub(crate) struct Update {
    pub exif: Option<Vec<u8>>,
    pub iim: Option<Vec<u8>>,
}

fn not_an_image(kind: ImageKind, err: impl std::fmt::Display) -> Error {
    log::debug!("{} container parse failed: {err}", kind.name());
    Error::NotAnImage(kind.name())
}

fn strip_exif_prefix(bytes: Bytes) -> Vec<u8> {
    bytes.strip_prefix(EXIF_PREFIX).unwrap_or(&bytes).to_vec()
}

pub(crate) fn extract(kind: ImageKind, data: &[u8]) -> Result<RawMetadata> {
    match kind {
        ImageKind::Jpeg => {
            let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(data)).map_err(|e| not_an_image(kind, e))?;
            let segment = |marker: u8, header: &[u8]| {
                jpeg.segments()
                    .iter()
                    .find(|s| s.marker() == marker && s.contents().starts_with(header))
                    .map(|s| s.contents().clone())
            };
            Ok(RawMetadata {
                exif: jpeg.exif().map(strip_exif_prefix),
                iim: segment(MARKER_APP13, PHOTOSHOP_HEADER)
                    .and_then(|app13| iptc::reader::find_iim(&app13).map(<[u8]>::to_vec)),
                xmp: segment(MARKER_APP1, XMP_HEADER).map(|c| c[XMP_HEADER.len()..].to_vec()),
                icc: jpeg.icc_profile().map(|b| b.to_vec()),
            })
        }
        ImageKind::Png => {
            let png = Png::from_bytes(Bytes::copy_from_slice(data)).map_err(|e| not_an_image(kind, e))?;
            let xmp = png
                .chunks()
                .iter()
                .filter(|c| c.kind() == *b"iTXt" && c.contents().starts_with(PNG_XMP_KEYWORD))
                .find_map(|c| itxt_text(c.contents()));
            Ok(RawMetadata {
                exif: png.exif().map(strip_exif_prefix),
                iim: None,
                xmp,
                icc: png_icc(&png),
            })
        }
        ImageKind::WebP => {
            let webp = WebP::from_bytes(Bytes::copy_from_slice(data)).map_err(|e| not_an_image(kind, e))?;
            Ok(RawMetadata {
                exif: webp.exif().map(strip_exif_prefix),
                iim: None,
                xmp: riff_chunk(data, b"XMP ").map(<[u8]>::to_vec),
                icc: webp.icc_profile().map(|b| b.to_vec()),
            })
        }
        ImageKind::Tiff => {
            let ifds = exif::reader::decode(data)?;
            let raw = |tag: u16| {
                ifds.find(&ExifKey::new(ExifGroup::Image, tag))
                    .and_then(|d| d.value().blob(ifds.byte_order()))
            };
            Ok(RawMetadata {
                exif: Some(data.to_vec()),
                iim: raw(exif::TAG_IPTC_NAA),
                xmp: raw(exif::TAG_XML_PACKET),
                icc: raw(exif::TAG_ICC_PROFILE),
            })
        }
    }
}

/// The PNG ICC profile. An iCCP chunk without a NUL-terminated profile
/// name and a compression method byte is treated as absent.
fn png_icc(png: &Png) -> Option<Vec<u8>> {
    let chunk = png.chunks().iter().find(|c| c.kind() == *b"iCCP")?;
    let well_formed = chunk
        .contents()
        .iter()
        .position(|&b| b == 0)
        .is_some_and(|nul| nul + 1 < chunk.contents().len());
    if !well_formed {
        log::warn!("Ignoring malformed PNG iCCP chunk");
        return None;
    }
    png.icc_profile().map(|b| b.to_vec())
}

/// Text of an uncompressed iTXt chunk.
fn itxt_text(contents: &[u8]) -> Option<Vec<u8>> {
    let rest = &contents[PNG_XMP_KEYWORD.len()..];
    let (&compressed, rest) = rest.split_first()?;
    if compressed != 0 {
        log::warn!("Compressed XMP iTXt chunk is not supported, skipping");
        return None;
    }
    // Compression method, then language tag and translated keyword.
    let rest = rest.get(1..)?;
    let lang_end = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_end + 1..];
    let keyword_end = rest.iter().position(|&b| b == 0)?;
    Some(rest[keyword_end + 1..].to_vec())
}

/// Payload of the first RIFF chunk with `fourcc` in a WebP file.
fn riff_chunk<'a>(data: &'a [u8], fourcc: &[u8; 4]) -> Option<&'a [u8]> {
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let id = &data[pos..pos + 4];
        let size = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().ok()?) as usize;
        let start = pos + 8;
        let payload = data.get(start..start.checked_add(size)?)?;
        if id == fourcc {
            return Some(payload);
        }
        pos = start + size + size % 2;
    }
    None
}

/// Rewrite `data` with the blocks in `update` replaced.
pub(crate) fn apply(kind: ImageKind, data: &[u8], update: Update) -> Result<Vec<u8>> {
    let iptc_requested = update.iim.as_ref().is_some_and(|iim| !iim.is_empty());

    match kind {
        ImageKind::Tiff => Err(Error::WritingUnsupported(kind.name())),
        ImageKind::Png | ImageKind::WebP if iptc_requested => Err(Error::UnsupportedSetting {
            domain: "IPTC metadata",
            format: kind.name(),
        }),
        ImageKind::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(data)).map_err(|e| not_an_image(kind, e))?;
            if let Some(tiff) = update.exif {
                set_jpeg_exif(&mut jpeg, tiff)?;
            }
            if let Some(iim) = update.iim {
                set_jpeg_iptc(&mut jpeg, &iim)?;
            }
            Ok(jpeg.encoder().bytes().to_vec())
        }
        ImageKind::Png => {
            let mut png = Png::from_bytes(Bytes::copy_from_slice(data)).map_err(|e| not_an_image(kind, e))?;
            if let Some(tiff) = update.exif {
                png.set_exif((!tiff.is_empty()).then(|| Bytes::from(tiff)));
            }
            Ok(png.encoder().bytes().to_vec())
        }
        ImageKind::WebP => {
            let mut webp = WebP::from_bytes(Bytes::copy_from_slice(data)).map_err(|e| not_an_image(kind, e))?;
            if let Some(tiff) = update.exif {
                webp.set_exif((!tiff.is_empty()).then(|| Bytes::from(tiff)));
            }
            Ok(webp.encoder().bytes().to_vec())
        }
    }
}

/// Find the position of the Exif APP1 segment in a JPEG.
fn find_exif_segment_pos(segments: &[JpegSegment]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.marker() == MARKER_APP1 && s.contents().starts_with(EXIF_PREFIX))
}

/// Replace the Exif APP1 segment in place. A new segment goes right after
/// APP0 so it precedes any XMP APP1, which many readers require.
fn set_jpeg_exif(jpeg: &mut Jpeg, tiff: Vec<u8>) -> Result<()> {
    let orig_pos = find_exif_segment_pos(jpeg.segments());
    let segments = jpeg.segments_mut();
    if let Some(pos) = orig_pos {
        segments.remove(pos);
    }
    if tiff.is_empty() {
        return Ok(());
    }

    let mut contents = Vec::with_capacity(EXIF_PREFIX.len() + tiff.len());
    contents.extend_from_slice(EXIF_PREFIX);
    contents.extend_from_slice(&tiff);
    let segment = jpeg_segment(MARKER_APP1, contents, "Exif")?;

    let after_app0 = usize::from(segments.first().is_some_and(|s| s.marker() == 0xE0));
    let target_pos = orig_pos.unwrap_or(after_app0).min(segments.len());
    segments.insert(target_pos, segment);
    Ok(())
}

fn set_jpeg_iptc(jpeg: &mut Jpeg, iim: &[u8]) -> Result<()> {
    let iptc_pos = jpeg
        .segments()
        .iter()
        .position(|s| s.marker() == MARKER_APP13 && s.contents().starts_with(PHOTOSHOP_HEADER));
    let existing = iptc_pos.map(|pos| jpeg.segments()[pos].contents().to_vec());

    let segments = jpeg.segments_mut();
    match (iptc::writer::build_app13(existing.as_deref(), iim), iptc_pos) {
        (Some(contents), Some(pos)) => {
            segments[pos] = jpeg_segment(MARKER_APP13, contents, "IPTC")?;
        }
        (Some(contents), None) => {
            // After the leading APP0/APP1 run (JFIF, Exif, XMP).
            let insert_pos = segments
                .iter()
                .position(|s| !matches!(s.marker(), 0xE0 | MARKER_APP1))
                .unwrap_or(segments.len());
            segments.insert(insert_pos, jpeg_segment(MARKER_APP13, contents, "IPTC")?);
        }
        (None, Some(pos)) => {
            segments.remove(pos);
        }
        (None, None) => {}
    }
    Ok(())
}

/// Build an APPn segment, refusing contents its length field cannot hold.
fn jpeg_segment(marker: u8, contents: Vec<u8>, what: &str) -> Result<JpegSegment> {
    if contents.len() > MAX_SEGMENT_CONTENTS {
        return Err(Error::InvalidValue {
            key: format!("{what} block"),
            reason: format!(
                "{} bytes do not fit in a JPEG segment (max {MAX_SEGMENT_CONTENTS})",
                contents.len()
            ),
        });
    }
    Ok(JpegSegment::new_with_contents(marker, Bytes::from(contents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_with(segments: &[(u8, &[u8])]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        for (marker, contents) in segments {
            out.extend_from_slice(&[0xFF, *marker]);
            out.extend_from_slice(&((contents.len() + 2) as u16).to_be_bytes());
            out.extend_from_slice(contents);
        }
        // Empty scan, then EOI.
        out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0xFF, 0xD9]);
        out
    }

    #[test]
    fn jpeg_xmp_and_iptc_are_found() {
        let mut xmp = XMP_HEADER.to_vec();
        xmp.extend_from_slice(b"<x:xmpmeta/>");
        let mut app13 = PHOTOSHOP_HEADER.to_vec();
        app13.extend_from_slice(b"8BIM\x04\x04\0\0\0\0\0\x02\x1c\x02");

        let data = jpeg_with(&[(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"), (0xE1, &xmp), (0xED, &app13)]);
        let raw = extract(ImageKind::Jpeg, &data).unwrap();
        assert_eq!(raw.xmp.as_deref(), Some(&b"<x:xmpmeta/>"[..]));
        assert_eq!(raw.iim.as_deref(), Some(&b"\x1c\x02"[..]));
        assert!(raw.exif.is_none());
        assert!(raw.icc.is_none());
    }

    #[test]
    fn jpeg_iptc_is_inserted_after_app_segments() {
        let data = jpeg_with(&[(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0")]);
        let update = Update {
            exif: None,
            iim: Some(b"\x1c\x02\x78\0\x01x".to_vec()),
        };
        let written = apply(ImageKind::Jpeg, &data, update).unwrap();

        let jpeg = Jpeg::from_bytes(Bytes::from(written.clone())).unwrap();
        let markers: Vec<u8> = jpeg.segments().iter().map(|s| s.marker()).collect();
        assert_eq!(&markers[..2], &[0xE0, MARKER_APP13]);

        let raw = extract(ImageKind::Jpeg, &written).unwrap();
        assert_eq!(raw.iim.as_deref(), Some(&b"\x1c\x02\x78\0\x01x"[..]));
    }

    #[test]
    fn jpeg_exif_goes_before_xmp() {
        let mut xmp = XMP_HEADER.to_vec();
        xmp.extend_from_slice(b"<x/>");
        let data = jpeg_with(&[(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"), (0xE1, &xmp)]);

        let tiff = b"II\x2a\0\x08\0\0\0\0\0\0\0\0\0".to_vec();
        let update = Update {
            exif: Some(tiff.clone()),
            iim: None,
        };
        let written = apply(ImageKind::Jpeg, &data, update).unwrap();
        let jpeg = Jpeg::from_bytes(Bytes::from(written.clone())).unwrap();
        assert_eq!(find_exif_segment_pos(jpeg.segments()), Some(1));
        assert_eq!(extract(ImageKind::Jpeg, &written).unwrap().exif, Some(tiff));
    }

    #[test]
    fn oversized_segments_are_refused() {
        let data = jpeg_with(&[(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0")]);
        let update = Update {
            exif: Some(vec![0; MAX_SEGMENT_CONTENTS]),
            iim: None,
        };
        assert_eq!(apply(ImageKind::Jpeg, &data, update).unwrap_err().code(), 25);

        let fits = MAX_SEGMENT_CONTENTS - EXIF_PREFIX.len();
        let update = Update {
            exif: Some(vec![0; fits]),
            iim: None,
        };
        assert!(apply(ImageKind::Jpeg, &data, update).is_ok());
    }

    #[test]
    fn unsupported_writes() {
        let err = apply(ImageKind::Tiff, b"II\x2a\0", Update::default()).unwrap_err();
        assert_eq!(err.code(), 33);

        let update = Update {
            exif: None,
            iim: Some(vec![0x1c]),
        };
        let err = apply(ImageKind::Png, b"\x89PNG\r\n\x1a\n", update).unwrap_err();
        assert_eq!(err.code(), 32);
    }

    #[test]
    fn png_itxt_payload() {
        let mut chunk = PNG_XMP_KEYWORD.to_vec();
        chunk.extend_from_slice(b"\0\0\0\0<x/>");
        assert_eq!(itxt_text(&chunk).as_deref(), Some(&b"<x/>"[..]));

        let mut chunk = PNG_XMP_KEYWORD.to_vec();
        chunk.extend_from_slice(b"\x01\0\0\0zz");
        assert_eq!(itxt_text(&chunk), None);
    }

    #[test]
    fn webp_riff_chunks() {
        let mut data = b"RIFF\0\0\0\0WEBP".to_vec();
        data.extend_from_slice(b"VP8X\x01\0\0\0\0\0");
        data.extend_from_slice(b"XMP \x04\0\0\0<x/>");
        assert_eq!(riff_chunk(&data, b"XMP "), Some(&b"<x/>"[..]));
        assert_eq!(riff_chunk(&data, b"EXIF"), None);
    }
}
