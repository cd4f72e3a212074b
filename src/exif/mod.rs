//! Exif metadata: keys, typed values and the TIFF structure that carries them.
//!
//! - [`ExifKey`] parses and prints `Exif.<Group>.<TagName>` keys
//! - [`ExifValue`] holds one tag's components in their TIFF type
//! - [`ExifData`] is the ordered collection read from (and written back to) an image
//!
//! The raw TIFF block is decoded and encoded by `kamadak-exif` in the private
//! `reader` and `writer` modules; the container layer hands them the bytes
//! after `Exif\0\0`. Key names and rendering stay here.

mod key;
pub(crate) mod reader;
mod value;
pub(crate) mod writer;

use std::fmt;

use crate::error::{Error, Result};
use crate::iter::{MetadataBlock, Metadatum};

pub(crate) use key::{TAG_ICC_PROFILE, TAG_IPTC_NAA, TAG_XML_PACKET};
pub use key::{ExifGroup, ExifKey, TagInfo};
pub use value::{ByteOrder, ExifValue, TypeId};

/// One Exif entry: a key and its typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Exifdatum {
    pub(crate) key: ExifKey,
    pub(crate) value: ExifValue,
}

impl Exifdatum {
    pub fn new(key: ExifKey, value: ExifValue) -> Self {
        Self { key, value }
    }

    /// The key as a string, e.g. `Exif.Image.Make`.
    pub fn key(&self) -> String {
        self.key.to_string()
    }

    pub fn exif_key(&self) -> ExifKey {
        self.key
    }

    pub fn value(&self) -> &ExifValue {
        &self.value
    }

    pub fn type_id(&self) -> TypeId {
        self.value.type_id()
    }
}

/// Renders the full value. Comment tags (`UserComment` and the GPS text tags)
/// decode their character-set header: `charset=Ascii text`.
impl fmt::Display for Exifdatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.key.is_comment()) {
            (ExifValue::Undefined(bytes), true) => f.write_str(&render_comment(bytes)),
            (value, _) => write!(f, "{value}"),
        }
    }
}

fn render_comment(bytes: &[u8]) -> String {
    if bytes.len() < 8 {
        return ExifValue::Undefined(bytes.to_vec()).to_string();
    }
    let (header, body) = bytes.split_at(8);
    let trim = |s: &str| s.trim_end_matches(['\0', ' ']).to_string();

    match header {
        b"ASCII\0\0\0" => format!("charset=Ascii {}", trim(&String::from_utf8_lossy(body))),
        b"UNICODE\0" => {
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            format!("charset=Unicode {}", trim(&String::from_utf16_lossy(&units)))
        }
        b"JIS\0\0\0\0\0" => format!("charset=Jis {}", trim(&String::from_utf8_lossy(body))),
        _ => trim(&String::from_utf8_lossy(body)),
    }
}

/// The Exif entries of one image, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    entries: Vec<Exifdatum>,
    byte_order: ByteOrder,
    pub(crate) thumbnail: Option<Vec<u8>>,
}

impl ExifData {
    /// Empty data that will encode with the given byte order.
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, datum: Exifdatum) {
        self.entries.push(datum);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Exifdatum> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// The IFD1 JPEG thumbnail, if the block carried one.
    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn find(&self, key: &ExifKey) -> Option<&Exifdatum> {
        self.entries.iter().find(|d| d.key == *key)
    }

    /// Look up an entry by its string key.
    ///
    /// A well-formed key with no entry gives `Ok(None)`; a malformed one is an error.
    pub fn find_key(&self, key: &str) -> Result<Option<&Exifdatum>> {
        let key: ExifKey = key.parse()?;
        Ok(self.find(&key))
    }

    /// The rendered value of `key`, if present.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.find_key(key)?.map(ToString::to_string))
    }

    /// Replace the first entry with `key`, or append one.
    pub fn set(&mut self, key: ExifKey, value: ExifValue) {
        match self.entries.iter_mut().find(|d| d.key == key) {
            Some(datum) => datum.value = value,
            None => self.entries.push(Exifdatum::new(key, value)),
        }
    }

    /// Set `key` to an ASCII string value.
    pub fn set_ascii(&mut self, key: &str, value: &str) -> Result<()> {
        let parsed: ExifKey = key.parse()?;
        if value.contains('\0') {
            return Err(Error::InvalidValue {
                key: key.to_string(),
                reason: "ASCII values cannot contain NUL".to_string(),
            });
        }
        self.set(parsed, ExifValue::Ascii(value.to_string()));
        Ok(())
    }

    /// Remove every entry with `key`. Returns how many were removed.
    pub fn remove(&mut self, key: &ExifKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|d| d.key != *key);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.thumbnail = None;
    }
}

impl<'a> IntoIterator for &'a ExifData {
    type Item = &'a Exifdatum;
    type IntoIter = std::slice::Iter<'a, Exifdatum>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Metadatum for Exifdatum {
    fn key(&self) -> String {
        Exifdatum::key(self)
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl MetadataBlock for ExifData {
    type Datum = Exifdatum;

    fn entries(&self) -> &[Exifdatum] {
        &self.entries
    }

    fn find_key(&self, key: &str) -> Result<Option<&Exifdatum>> {
        ExifData::find_key(self, key)
    }
}
