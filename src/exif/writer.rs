use std::io::Cursor;

use ::exif::experimental::Writer;
use ::exif::{Context, Field, In, Tag};

use super::key::ExifGroup;
use super::{ExifData, Exifdatum};
use crate::error::{Error, Result};

/// Encode [`ExifData`] as a complete TIFF structure.
///
/// Entries are sorted by tag within each IFD. Pointer tags and the thumbnail
/// location are laid out by the writer; their stored values are ignored, so
/// IFD1 only points at a thumbnail when one is carried. Returns an empty
/// vector for empty data.
pub(crate) fn encode(data: &ExifData) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut fields: Vec<Field> = data.iter().map(to_field).collect();
    fields.sort_by_key(|f| f.tag.number());

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    if let Some(thumbnail) = data.thumbnail() {
        writer.set_jpeg(thumbnail, In::THUMBNAIL);
    }

    let mut out = Cursor::new(Vec::new());
    writer
        .write(&mut out, data.byte_order().is_little())
        .map_err(|e| Error::General(format!("Failed to encode Exif data: {e}")))?;
    Ok(out.into_inner())
}

fn to_field(datum: &Exifdatum) -> Field {
    let (context, ifd_num) = match datum.key.group() {
        ExifGroup::Image => (Context::Tiff, In::PRIMARY),
        ExifGroup::Thumbnail => (Context::Tiff, In::THUMBNAIL),
        ExifGroup::Photo => (Context::Exif, In::PRIMARY),
        ExifGroup::GpsInfo => (Context::Gps, In::PRIMARY),
        ExifGroup::Iop => (Context::Interop, In::PRIMARY),
    };
    Field {
        tag: Tag(context, datum.key.tag()),
        ifd_num,
        value: datum.value.to_tiff(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{reader, ByteOrder, ExifKey, ExifValue};
    use super::*;

    fn sample(order: ByteOrder) -> ExifData {
        let mut data = ExifData::with_byte_order(order);
        data.set_ascii("Exif.Image.Make", "FakeMake").unwrap();
        data.set_ascii("Exif.Image.Model", "FakeModel").unwrap();
        data.set(
            "Exif.Image.XResolution".parse::<ExifKey>().unwrap(),
            ExifValue::Rational(vec![(72, 1)]),
        );
        data.set(
            "Exif.Photo.ExifVersion".parse::<ExifKey>().unwrap(),
            ExifValue::Undefined(b"0230".to_vec()),
        );
        data.set_ascii("Exif.GPSInfo.GPSLatitudeRef", "N").unwrap();
        data.set_ascii("Exif.Iop.InteroperabilityIndex", "R98").unwrap();
        data
    }

    #[test]
    fn empty_data_encodes_to_nothing() {
        assert!(encode(&ExifData::default()).unwrap().is_empty());
    }

    #[test]
    fn encode_then_decode_keeps_values() {
        for (order, marker) in [(ByteOrder::Little, b"II"), (ByteOrder::Big, b"MM")] {
            let bytes = encode(&sample(order)).unwrap();
            assert_eq!(&bytes[0..2], marker);

            let back = reader::decode(&bytes).unwrap();
            assert_eq!(back.byte_order(), order);
            assert_eq!(back.get_string("Exif.Image.Make").unwrap().as_deref(), Some("FakeMake"));
            assert_eq!(back.get_string("Exif.Image.XResolution").unwrap().as_deref(), Some("72/1"));
            assert_eq!(
                back.get_string("Exif.Photo.ExifVersion").unwrap().as_deref(),
                Some("48 50 51 48")
            );
            assert_eq!(back.get_string("Exif.GPSInfo.GPSLatitudeRef").unwrap().as_deref(), Some("N"));
            assert_eq!(
                back.get_string("Exif.Iop.InteroperabilityIndex").unwrap().as_deref(),
                Some("R98")
            );
        }
    }

    #[test]
    fn pointer_tags_are_not_duplicated() {
        let back = reader::decode(&encode(&sample(ByteOrder::Little)).unwrap()).unwrap();
        let again = reader::decode(&encode(&back).unwrap()).unwrap();

        let count = |data: &ExifData, key: &str| data.iter().filter(|d| d.key() == key).count();
        for key in ["Exif.Image.ExifTag", "Exif.Image.GPSTag", "Exif.Photo.InteroperabilityTag"] {
            assert_eq!(count(&back, key), 1, "{key}");
            assert_eq!(count(&again, key), 1, "{key}");
        }
        assert_eq!(again.get_string("Exif.Image.Make").unwrap().as_deref(), Some("FakeMake"));
    }

    #[test]
    fn entries_are_sorted_per_ifd() {
        let mut data = ExifData::default();
        data.set_ascii("Exif.Image.Model", "B").unwrap();
        data.set_ascii("Exif.Image.Make", "A").unwrap();
        let back = reader::decode(&encode(&data).unwrap()).unwrap();
        let keys: Vec<String> = back.iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["Exif.Image.Make", "Exif.Image.Model"]);
    }

    #[test]
    fn thumbnail_is_carried() {
        let mut data = sample(ByteOrder::Big);
        data.set(
            "Exif.Thumbnail.Compression".parse::<ExifKey>().unwrap(),
            ExifValue::Short(vec![6]),
        );
        data.thumbnail = Some(vec![0xFF, 0xD8, 0xFF, 0xD9, 0x00]);

        let back = reader::decode(&encode(&data).unwrap()).unwrap();
        assert_eq!(back.thumbnail(), Some(&[0xFF, 0xD8, 0xFF, 0xD9, 0x00][..]));
        assert_eq!(
            back.get_string("Exif.Thumbnail.JPEGInterchangeFormatLength").unwrap().as_deref(),
            Some("5")
        );
    }

    #[test]
    fn stale_thumbnail_location_is_dropped() {
        let mut data = sample(ByteOrder::Little);
        data.set(
            "Exif.Thumbnail.Compression".parse::<ExifKey>().unwrap(),
            ExifValue::Short(vec![6]),
        );
        data.set(
            "Exif.Thumbnail.JPEGInterchangeFormat".parse::<ExifKey>().unwrap(),
            ExifValue::Long(vec![9999]),
        );
        data.set(
            "Exif.Thumbnail.JPEGInterchangeFormatLength".parse::<ExifKey>().unwrap(),
            ExifValue::Long(vec![4]),
        );
        assert!(data.thumbnail().is_none());

        let back = reader::decode(&encode(&data).unwrap()).unwrap();
        assert_eq!(back.get_string("Exif.Thumbnail.Compression").unwrap().as_deref(), Some("6"));
        assert!(back.find_key("Exif.Thumbnail.JPEGInterchangeFormat").unwrap().is_none());
        assert!(back.find_key("Exif.Thumbnail.JPEGInterchangeFormatLength").unwrap().is_none());
        assert!(back.thumbnail().is_none());
    }
}
