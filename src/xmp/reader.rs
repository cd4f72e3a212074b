use std::collections::HashMap;

use super::key::{namespace_prefix, RDF_NS};
use super::parser::{self, split_qname, Element};
use super::{XmpData, XmpKey, XmpValue, Xmpdatum};
use crate::error::{Error, Result};

/// Decode a serialized XMP packet into [`XmpData`].
///
/// Prefixes declared in the packet are mapped onto the well-known prefix of
/// their namespace URI where one exists; otherwise the packet's own prefix is
/// kept and remembered so keys using it can be looked up.
pub(crate) fn decode(packet: &[u8]) -> Result<XmpData> {
    let text = String::from_utf8_lossy(packet);
    let text = text.trim_start_matches('\u{feff}').trim_end_matches(['\0', ' ', '\n', '\r', '\t']);
    if text.is_empty() {
        return Ok(XmpData::default());
    }

    let root = parser::parse(text)?;
    let mut walker = RdfWalker {
        prefixes: HashMap::new(),
        rdf: "rdf".to_string(),
        data: XmpData::default(),
    };

    for (prefix, uri) in root.namespace_decls() {
        if uri == RDF_NS {
            walker.rdf = prefix.clone();
        }
        let canonical = match namespace_prefix(&uri) {
            Some(known) => known.to_string(),
            None => {
                walker.data.namespaces.insert(prefix.clone(), uri);
                prefix.clone()
            }
        };
        walker.prefixes.insert(prefix, canonical);
    }

    let rdf_root = root
        .find(&format!("{}:RDF", walker.rdf))
        .ok_or_else(|| Error::corrupt("XMP packet has no rdf:RDF element"))?;

    let description = format!("{}:Description", walker.rdf);
    for desc in rdf_root.elements().filter(|e| e.name == description) {
        walker.description(desc);
    }

    Ok(walker.data)
}

struct RdfWalker {
    /// Packet prefix to key prefix.
    prefixes: HashMap<String, String>,
    rdf: String,
    data: XmpData,
}

impl RdfWalker {
    fn is_rdf(&self, name: &str, local: &str) -> bool {
        split_qname(name) == (self.rdf.as_str(), local)
    }

    /// Key prefix and local name for a qualified name, or `None` for syntax
    /// names (`rdf:`, `xml:`, `xmlns`) and undeclared prefixes.
    fn qualify(&self, name: &str) -> Option<(String, String)> {
        let (prefix, local) = split_qname(name);
        if prefix.is_empty() || prefix == self.rdf || prefix == "xml" || prefix == "xmlns" {
            return None;
        }
        match self.prefixes.get(prefix) {
            Some(canonical) => Some((canonical.clone(), local.to_string())),
            None => {
                log::warn!("XMP property `{name}` uses an undeclared prefix, skipping");
                None
            }
        }
    }

    fn push(&mut self, schema: &str, path: String, value: XmpValue) {
        self.data.push(Xmpdatum::new(XmpKey::new(schema, path), value));
    }

    fn description(&mut self, desc: &Element) {
        for (name, value) in &desc.attrs {
            if let Some((schema, local)) = self.qualify(name) {
                self.push(&schema, local, XmpValue::Text(value.clone()));
            }
        }
        for child in desc.elements() {
            if let Some((schema, local)) = self.qualify(&child.name) {
                self.property(child, &schema, local);
            }
        }
    }

    fn property(&mut self, el: &Element, schema: &str, path: String) {
        if let Some(resource) = el.attr(&format!("{}:resource", self.rdf)) {
            self.push(schema, path, XmpValue::Text(resource.to_string()));
            return;
        }

        let container = el.elements().find(|e| {
            self.is_rdf(&e.name, "Bag") || self.is_rdf(&e.name, "Seq") || self.is_rdf(&e.name, "Alt")
        });
        if let Some(container) = container {
            self.array(container, schema, path);
            return;
        }

        let is_struct = el.attr(&format!("{}:parseType", self.rdf)) == Some("Resource")
            || el.elements().next().is_some()
            || el.attrs.iter().any(|(name, _)| self.qualify(name).is_some());
        if is_struct {
            self.push(schema, path.clone(), XmpValue::Text(String::new()));
            self.fields(el, schema, &path);
            return;
        }

        self.push(schema, path, XmpValue::Text(el.text()));
    }

    fn array(&mut self, container: &Element, schema: &str, path: String) {
        let items: Vec<&Element> = container.elements().filter(|e| self.is_rdf(&e.name, "li")).collect();
        let kind = split_qname(&container.name).1;

        let has_structs = items.iter().any(|li| {
            li.attr(&format!("{}:parseType", self.rdf)) == Some("Resource")
                || li.elements().next().is_some()
                || li.attrs.iter().any(|(name, _)| self.qualify(name).is_some())
        });

        if has_structs {
            self.push(schema, path.clone(), empty_array(kind));
            for (i, li) in items.iter().enumerate() {
                self.fields(li, schema, &format!("{path}[{}]", i + 1));
            }
            return;
        }

        let texts = items.iter().map(|li| li.text());
        let value = match kind {
            "Alt" if items.iter().any(|li| li.attr("xml:lang").is_some()) => XmpValue::LangAlt(
                items
                    .iter()
                    .map(|li| (li.attr("xml:lang").unwrap_or("x-default").to_string(), li.text()))
                    .collect(),
            ),
            "Alt" => XmpValue::Alt(texts.collect()),
            "Seq" => XmpValue::Seq(texts.collect()),
            _ => XmpValue::Bag(texts.collect()),
        };
        self.push(schema, path, value);
    }

    /// Flatten a structure's fields as `path/ns:field`.
    fn fields(&mut self, node: &Element, schema: &str, path: &str) {
        for (name, value) in &node.attrs {
            if let Some((prefix, local)) = self.qualify(name) {
                self.push(schema, format!("{path}/{prefix}:{local}"), XmpValue::Text(value.clone()));
            }
        }
        for child in node.elements() {
            if self.is_rdf(&child.name, "Description") {
                self.fields(child, schema, path);
            } else if let Some((prefix, local)) = self.qualify(&child.name) {
                self.property(child, schema, format!("{path}/{prefix}:{local}"));
            }
        }
    }
}

fn empty_array(kind: &str) -> XmpValue {
    match kind {
        "Seq" => XmpValue::Seq(Vec::new()),
        "Alt" => XmpValue::Alt(Vec::new()),
        _ => XmpValue::Bag(Vec::new()),
    }
}
