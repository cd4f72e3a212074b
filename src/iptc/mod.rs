//! IPTC-IIM metadata, as carried in JPEG APP13 (Photoshop resource 0x0404)
//! or the TIFF `IPTCNAA` tag.

mod key;
pub(crate) mod reader;
mod value;
pub(crate) mod writer;

use std::fmt;

use crate::error::{Error, Result};
use crate::iter::{MetadataBlock, Metadatum};

pub use key::{DataSetInfo, IptcKey, IptcType};
pub use value::IptcValue;

pub(crate) const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
pub(crate) const IRB_SIGNATURE: &[u8] = b"8BIM";
pub(crate) const IRB_IPTC_ID: u16 = 0x0404;

/// One IPTC dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Iptcdatum {
    pub(crate) key: IptcKey,
    pub(crate) value: IptcValue,
}

impl Iptcdatum {
    pub fn new(key: IptcKey, value: IptcValue) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> String {
        self.key.to_string()
    }

    pub fn iptc_key(&self) -> IptcKey {
        self.key
    }

    pub fn value(&self) -> &IptcValue {
        &self.value
    }
}

impl fmt::Display for Iptcdatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// The IPTC datasets of one image, in stream order. Repeatable datasets
/// (such as `Keywords`) appear once per value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IptcData {
    entries: Vec<Iptcdatum>,
}

impl IptcData {
    pub(crate) fn push(&mut self, datum: Iptcdatum) {
        self.entries.push(datum);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Iptcdatum> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First dataset with `key`.
    pub fn find(&self, key: &IptcKey) -> Option<&Iptcdatum> {
        self.entries.iter().find(|d| d.key == *key)
    }

    pub fn find_key(&self, key: &str) -> Result<Option<&Iptcdatum>> {
        let key: IptcKey = key.parse()?;
        Ok(self.find(&key))
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.find_key(key)?.map(ToString::to_string))
    }

    /// Set the first dataset with `key` to a plain string, or append one.
    pub fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        let key: IptcKey = key.parse()?;
        if value.len() > u32::MAX as usize {
            return Err(Error::InvalidValue {
                key: key.to_string(),
                reason: "value too large for an IPTC dataset".to_string(),
            });
        }
        let value = IptcValue::String(value.to_string());
        match self.entries.iter_mut().find(|d| d.key == key) {
            Some(datum) => datum.value = value,
            None => self.entries.push(Iptcdatum::new(key, value)),
        }
        Ok(())
    }

    /// Append a dataset even if one with the same key exists.
    pub fn add(&mut self, datum: Iptcdatum) {
        self.entries.push(datum);
    }

    pub fn remove(&mut self, key: &IptcKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|d| d.key != *key);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a IptcData {
    type Item = &'a Iptcdatum;
    type IntoIter = std::slice::Iter<'a, Iptcdatum>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Metadatum for Iptcdatum {
    fn key(&self) -> String {
        Iptcdatum::key(self)
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl MetadataBlock for IptcData {
    type Datum = Iptcdatum;

    fn entries(&self) -> &[Iptcdatum] {
        &self.entries
    }

    fn find_key(&self, key: &str) -> Result<Option<&Iptcdatum>> {
        IptcData::find_key(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_string_replaces_first_match_only() {
        let keywords: IptcKey = "Iptc.Application2.Keywords".parse().unwrap();
        let mut data = IptcData::default();
        data.add(Iptcdatum::new(keywords, IptcValue::String("one".into())));
        data.add(Iptcdatum::new(keywords, IptcValue::String("two".into())));

        data.set_string("Iptc.Application2.Keywords", "uno").unwrap();
        let values: Vec<String> = data.iter().map(ToString::to_string).collect();
        assert_eq!(values, ["uno", "two"]);
    }

    #[test]
    fn set_string_on_date_dataset_stores_text() {
        let mut data = IptcData::default();
        data.set_string("Iptc.Application2.DateCreated", "2024-01-01").unwrap();
        let datum = data.find_key("Iptc.Application2.DateCreated").unwrap().unwrap();
        assert_eq!(datum.value().type_name(), "String");
        assert_eq!(datum.to_string(), "2024-01-01");
    }

    #[test]
    fn lookup_errors_follow_key_errors() {
        let data = IptcData::default();
        assert!(data.find_key("Iptc.Application2.Caption").unwrap().is_none());
        assert_eq!(data.find_key("Iptc.Invalid.Key").unwrap_err().code(), 5);
    }
}
