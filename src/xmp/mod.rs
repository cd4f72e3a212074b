//! XMP metadata read from the RDF/XML packet embedded in an image.
//!
//! Packets are read, never re-serialized: write-back leaves the original
//! packet in place. Structures and arrays of structures are flattened into
//! path keys (`Xmp.xmpMM.DerivedFrom/stRef:documentID`).

mod key;
mod parser;
pub(crate) mod reader;
mod value;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::iter::{MetadataBlock, Metadatum};

pub use key::{namespace_prefix, namespace_uri, XmpKey};
pub use value::XmpValue;

/// One XMP property.
#[derive(Debug, Clone, PartialEq)]
pub struct Xmpdatum {
    pub(crate) key: XmpKey,
    pub(crate) value: XmpValue,
}

impl Xmpdatum {
    pub fn new(key: XmpKey, value: XmpValue) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> String {
        self.key.to_string()
    }

    pub fn xmp_key(&self) -> &XmpKey {
        &self.key
    }

    pub fn value(&self) -> &XmpValue {
        &self.value
    }

    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// Bags render every item joined; everything else renders its first value.
    pub fn render(&self) -> String {
        match self.value {
            XmpValue::Bag(_) => self.value.to_string(),
            _ => self.value.to_string_at(0),
        }
    }
}

impl fmt::Display for Xmpdatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmpData {
    entries: Vec<Xmpdatum>,
    /// Namespaces declared by the packet that are not well known.
    pub(crate) namespaces: BTreeMap<String, String>,
}

impl XmpData {
    pub(crate) fn push(&mut self, datum: Xmpdatum) {
        self.entries.push(datum);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Xmpdatum> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// URI for `prefix`, from the well-known list or this packet's declarations.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        namespace_uri(prefix).or_else(|| self.namespaces.get(prefix).map(String::as_str))
    }

    pub fn find_key(&self, key: &str) -> Result<Option<&Xmpdatum>> {
        let key: XmpKey = key.parse()?;
        if self.namespace(key.prefix()).is_none() {
            return Err(Error::NoNamespaceForPrefix(key.prefix().to_string()));
        }
        Ok(self.entries.iter().find(|d| d.key == key))
    }

    /// The single-value rendering of `key` (see [`Xmpdatum::render`]).
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.find_key(key)?.map(Xmpdatum::render))
    }
}

impl<'a> IntoIterator for &'a XmpData {
    type Item = &'a Xmpdatum;
    type IntoIter = std::slice::Iter<'a, Xmpdatum>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Metadatum for Xmpdatum {
    fn key(&self) -> String {
        Xmpdatum::key(self)
    }

    fn render(&self) -> String {
        Xmpdatum::render(self)
    }
}

impl MetadataBlock for XmpData {
    type Datum = Xmpdatum;

    fn entries(&self) -> &[Xmpdatum] {
        &self.entries
    }

    fn find_key(&self, key: &str) -> Result<Option<&Xmpdatum>> {
        XmpData::find_key(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(key: &str, value: XmpValue) -> Xmpdatum {
        Xmpdatum::new(key.parse().unwrap(), value)
    }

    #[test]
    fn render_joins_bags_only() {
        let bag = datum("Xmp.dc.subject", XmpValue::Bag(vec!["a".into(), "b".into()]));
        assert_eq!(bag.render(), "a, b");

        let seq = datum("Xmp.dc.creator", XmpValue::Seq(vec!["x".into(), "y".into()]));
        assert_eq!(seq.render(), "x");
        assert_eq!(seq.to_string(), "x, y");

        let text = datum("Xmp.xmp.Rating", XmpValue::Text("5".into()));
        assert_eq!(text.render(), "5");
    }

    #[test]
    fn find_key_checks_namespace() {
        let mut data = XmpData::default();
        data.push(datum("Xmp.dc.format", XmpValue::Text("image/jpeg".into())));

        assert_eq!(data.get_string("Xmp.dc.format").unwrap().as_deref(), Some("image/jpeg"));
        assert!(data.find_key("Xmp.dc.title").unwrap().is_none());
        assert_eq!(data.find_key("Xmp.unknown.title").unwrap_err().code(), 36);
        assert_eq!(data.find_key("NotXmp").unwrap_err().code(), 6);
    }
}
