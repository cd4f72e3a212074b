use ::exif::{Context, Exif, In, Reader, Tag};

use super::key::{ExifGroup, ExifKey};
use super::value::{ByteOrder, ExifValue};
use super::{ExifData, Exifdatum};
use crate::error::{Error, Result};

/// Decode a TIFF structure (the payload after `Exif\0\0`) into [`ExifData`].
///
/// Fields outside IFD0, IFD1 and their sub-IFDs, and fields of unknown type,
/// are skipped.
pub(crate) fn decode(tiff: &[u8]) -> Result<ExifData> {
    let exif = Reader::new()
        .read_raw(tiff.to_vec())
        .map_err(|e| Error::corrupt(format!("invalid Exif data: {e}")))?;

    let mut data = ExifData::with_byte_order(ByteOrder::from_little_endian(exif.little_endian()));
    for field in exif.fields() {
        let Some(group) = group_of(field.tag, field.ifd_num) else {
            log::debug!("Skipping {} in {:?}", field.tag, field.ifd_num);
            continue;
        };
        let Some(value) = ExifValue::from_tiff(&field.value) else {
            log::debug!("Skipping {} with an unknown type", field.tag);
            continue;
        };
        data.push(Exifdatum::new(ExifKey::new(group, field.tag.number()), value));
    }
    data.thumbnail = thumbnail(&exif);

    Ok(data)
}

fn group_of(tag: Tag, ifd: In) -> Option<ExifGroup> {
    match (tag.context(), ifd) {
        (Context::Tiff, In::PRIMARY) => Some(ExifGroup::Image),
        (Context::Tiff, In::THUMBNAIL) => Some(ExifGroup::Thumbnail),
        (Context::Exif, In::PRIMARY) => Some(ExifGroup::Photo),
        (Context::Gps, In::PRIMARY) => Some(ExifGroup::GpsInfo),
        (Context::Interop, In::PRIMARY) => Some(ExifGroup::Iop),
        _ => None,
    }
}

/// The IFD1 JPEG thumbnail, if both location tags are present and in bounds.
fn thumbnail(exif: &Exif) -> Option<Vec<u8>> {
    let uint = |tag| exif.get_field(tag, In::THUMBNAIL).and_then(|f| f.value.get_uint(0));
    let offset = uint(Tag::JPEGInterchangeFormat)? as usize;
    let length = uint(Tag::JPEGInterchangeFormatLength)? as usize;

    let bytes = exif.buf().get(offset..offset.checked_add(length)?);
    if bytes.is_none() {
        log::warn!("Thumbnail data out of bounds, dropping it");
    }
    bytes.map(<[u8]>::to_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal big-endian TIFF: IFD0 { Make = "Abc" }.
    fn tiny_be() -> Vec<u8> {
        let mut t = b"MM\0\x2a\0\0\0\x08".to_vec();
        t.extend_from_slice(&[0, 1]); // one entry
        t.extend_from_slice(&[0x01, 0x0f, 0, 2, 0, 0, 0, 4]);
        t.extend_from_slice(b"Abc\0");
        t.extend_from_slice(&[0, 0, 0, 0]); // no IFD1
        t
    }

    #[test]
    fn decodes_big_endian_inline_ascii() {
        let data = decode(&tiny_be()).unwrap();
        assert_eq!(data.byte_order(), ByteOrder::Big);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get_string("Exif.Image.Make").unwrap().as_deref(), Some("Abc"));
        assert!(data.thumbnail().is_none());
    }

    #[test]
    fn rejects_bad_headers() {
        assert_eq!(decode(b"XX\0\x2a\0\0\0\x08").unwrap_err().code(), 14);
        assert_eq!(decode(b"II\x2b\0\x08\0\0\0").unwrap_err().code(), 14);
        assert_eq!(decode(b"II").unwrap_err().code(), 14);
    }

    #[test]
    fn ifd0_out_of_bounds_is_an_error() {
        let err = decode(b"II\x2a\0\xff\0\0\0").unwrap_err();
        assert_eq!(err.code(), 14);
    }

    #[test]
    fn unknown_field_types_are_skipped() {
        let mut t = tiny_be();
        t[9] = 2;
        t.truncate(22);
        // Tag 0x0110 with type 13, which TIFF does not define.
        t.extend_from_slice(&[0x01, 0x10, 0, 13, 0, 0, 0, 1, 0, 0, 0, 0]);
        t.extend_from_slice(&[0, 0, 0, 0]);
        let data = decode(&t).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.get_string("Exif.Image.Make").unwrap().as_deref(), Some("Abc"));
    }
}
