use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub(crate) const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Well-known schemas, keyed by the prefix keys use for them.
static NAMESPACES: &[(&str, &str)] = &[
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("xmp", "http://ns.adobe.com/xap/1.0/"),
    ("xmpRights", "http://ns.adobe.com/xap/1.0/rights/"),
    ("xmpMM", "http://ns.adobe.com/xap/1.0/mm/"),
    ("xmpBJ", "http://ns.adobe.com/xap/1.0/bj/"),
    ("xmpTPg", "http://ns.adobe.com/xap/1.0/t/pg/"),
    ("xmpDM", "http://ns.adobe.com/xmp/1.0/DynamicMedia/"),
    ("xmpG", "http://ns.adobe.com/xap/1.0/g/"),
    ("xmpGImg", "http://ns.adobe.com/xap/1.0/g/img/"),
    ("xmpidq", "http://ns.adobe.com/xmp/Identifier/qual/1.0/"),
    ("xmpNote", "http://ns.adobe.com/xmp/note/"),
    ("stEvt", "http://ns.adobe.com/xap/1.0/sType/ResourceEvent#"),
    ("stRef", "http://ns.adobe.com/xap/1.0/sType/ResourceRef#"),
    ("stDim", "http://ns.adobe.com/xap/1.0/sType/Dimensions#"),
    ("pdf", "http://ns.adobe.com/pdf/1.3/"),
    ("photoshop", "http://ns.adobe.com/photoshop/1.0/"),
    ("crs", "http://ns.adobe.com/camera-raw-settings/1.0/"),
    ("tiff", "http://ns.adobe.com/tiff/1.0/"),
    ("exif", "http://ns.adobe.com/exif/1.0/"),
    ("exifEX", "http://cipa.jp/exif/1.0/"),
    ("aux", "http://ns.adobe.com/exif/1.0/aux/"),
    ("iptc", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/"),
    ("iptcExt", "http://iptc.org/std/Iptc4xmpExt/2008-02-29/"),
    ("plus", "http://ns.useplus.org/ldf/xmp/1.0/"),
    ("lr", "http://ns.adobe.com/lightroom/1.0/"),
    ("GPano", "http://ns.google.com/photos/1.0/panorama/"),
    ("GImage", "http://ns.google.com/photos/1.0/image/"),
    ("GCamera", "http://ns.google.com/photos/1.0/camera/"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
];

/// Registered URI for a well-known prefix.
pub fn namespace_uri(prefix: &str) -> Option<&'static str> {
    NAMESPACES.iter().find(|(p, _)| *p == prefix).map(|(_, uri)| *uri)
}

/// Registered prefix for a well-known URI.
pub fn namespace_prefix(uri: &str) -> Option<&'static str> {
    NAMESPACES.iter().find(|(_, u)| *u == uri).map(|(p, _)| *p)
}

/// A parsed `Xmp.<prefix>.<property>` key.
///
/// The property may be a path into structures and arrays, such as
/// `DerivedFrom/stRef:documentID` or `History[1]/stEvt:action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmpKey {
    prefix: String,
    property: String,
}

impl XmpKey {
    pub fn new(prefix: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            property: property.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

/// Checks the `Xmp.prefix.property` shape only. Whether the prefix is known is
/// decided by the data the key is used against.
impl FromStr for XmpKey {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        let mut parts = key.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("Xmp"), Some(prefix), Some(property)) if !prefix.is_empty() && !property.is_empty() => {
                Ok(XmpKey::new(prefix, property))
            }
            _ => Err(Error::InvalidKey(key.to_string())),
        }
    }
}

impl fmt::Display for XmpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Xmp.{}.{}", self.prefix, self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_paths_survive_parsing() {
        let key: XmpKey = "Xmp.xmpMM.History[1]/stEvt:action".parse().unwrap();
        assert_eq!(key.prefix(), "xmpMM");
        assert_eq!(key.property(), "History[1]/stEvt:action");
        assert_eq!(key.to_string(), "Xmp.xmpMM.History[1]/stEvt:action");
    }

    #[test]
    fn malformed_keys() {
        for bad in ["Xmp", "Xmp.dc", "Xmp..title", "Xmp.dc.", "Exif.dc.title"] {
            assert_eq!(bad.parse::<XmpKey>().unwrap_err().code(), 6, "{bad}");
        }
    }

    #[test]
    fn registry_lookups_both_ways() {
        assert_eq!(namespace_uri("dc"), Some("http://purl.org/dc/elements/1.1/"));
        assert_eq!(namespace_prefix("http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/"), Some("iptc"));
        assert_eq!(namespace_uri("nope"), None);
    }
}
