//! Just enough XML to read an XMP packet: elements, attributes, text,
//! character references. Processing instructions, comments and DOCTYPE
//! declarations are skipped.

use crate::error::{Error, Result};

// Real packets nest a dozen levels; anything deeper is refused before the
// recursive descent can exhaust the stack.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    /// Qualified name as written, e.g. `dc:subject`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn prefix(&self) -> &str {
        split_qname(&self.name).0
    }

    pub fn local(&self) -> &str {
        split_qname(&self.name).1
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Depth-first search for the first element named `name`, self included.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(name))
    }

    /// Every `xmlns:prefix` declaration in this subtree, outermost first.
    pub fn namespace_decls(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .attrs
            .iter()
            .filter_map(|(k, v)| Some((k.strip_prefix("xmlns:")?.to_string(), v.clone())))
            .collect();
        for child in self.elements() {
            out.extend(child.namespace_decls());
        }
        out
    }
}

pub(crate) fn split_qname(name: &str) -> (&str, &str) {
    name.split_once(':').unwrap_or(("", name))
}

/// Parse an XML document and return its root element.
pub(crate) fn parse(xml: &str) -> Result<Element> {
    let mut parser = Parser {
        src: xml,
        pos: 0,
        depth: 0,
    };
    parser.skip_misc()?;
    let root = parser.element()?;
    Ok(root)
}

fn malformed(what: &str, pos: usize) -> Error {
    Error::corrupt(format!("XMP packet: {what} at byte {pos}"))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn skip_past(&mut self, end: &str) -> Result<()> {
        match self.rest().find(end) {
            Some(i) => {
                self.pos += i + end.len();
                Ok(())
            }
            None => Err(malformed(&format!("missing `{end}`"), self.pos)),
        }
    }

    /// Skip whitespace, processing instructions, comments and DOCTYPE.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.skip_ws();
            if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<!") && !self.starts_with("<![CDATA[") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '='))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(malformed("expected a name", self.pos));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if !self.starts_with(s) {
            return Err(malformed(&format!("expected `{s}`"), self.pos));
        }
        self.pos += s.len();
        Ok(())
    }

    fn element(&mut self) -> Result<Element> {
        if self.depth == MAX_DEPTH {
            return Err(malformed(&format!("elements nested deeper than {MAX_DEPTH}"), self.pos));
        }
        self.depth += 1;
        let element = self.element_body();
        self.depth -= 1;
        element
    }

    fn element_body(&mut self) -> Result<Element> {
        self.expect("<")?;
        let mut element = Element {
            name: self.name()?.to_string(),
            ..Element::default()
        };

        loop {
            self.skip_ws();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(element);
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            let key = self.name()?.to_string();
            self.skip_ws();
            self.expect("=")?;
            self.skip_ws();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(malformed("expected quoted attribute value", self.pos)),
            };
            self.pos += 1;
            let end = self
                .rest()
                .find(quote)
                .ok_or_else(|| malformed("unterminated attribute", self.pos))?;
            let value = unescape(&self.rest()[..end]);
            self.pos += end + 1;
            element.attrs.push((key, value));
        }

        loop {
            if self.starts_with("</") {
                self.pos += 2;
                let close = self.name()?;
                if close != element.name {
                    return Err(malformed(&format!("`</{close}>` closes `<{}>`", element.name), self.pos));
                }
                self.skip_ws();
                self.expect(">")?;
                return Ok(element);
            } else if self.starts_with("<![CDATA[") {
                self.pos += 9;
                let end = self
                    .rest()
                    .find("]]>")
                    .ok_or_else(|| malformed("unterminated CDATA", self.pos))?;
                element.children.push(Node::Text(self.rest()[..end].to_string()));
                self.pos += end + 3;
            } else if self.starts_with("<!--") || self.starts_with("<?") {
                self.skip_misc()?;
            } else if self.starts_with("<") {
                let child = self.element()?;
                element.children.push(Node::Element(child));
            } else if self.rest().is_empty() {
                return Err(malformed(&format!("unclosed `<{}>`", element.name), self.pos));
            } else {
                let end = self.rest().find('<').unwrap_or(self.rest().len());
                let text = unescape(&self.rest()[..end]);
                self.pos += end;
                element.children.push(Node::Text(text));
            }
        }
    }
}

fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16).ok())
                .unwrap_or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let root = parse(
            r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<!-- comment -->
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about='' xmlns:dc="http://purl.org/dc/elements/1.1/">
      <dc:format>image/jpeg</dc:format>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>"#,
        )
        .unwrap();

        assert_eq!(root.name, "x:xmpmeta");
        let desc = root.find("rdf:Description").unwrap();
        assert_eq!(desc.attr("rdf:about"), Some(""));
        let format = desc.elements().next().unwrap();
        assert_eq!((format.prefix(), format.local()), ("dc", "format"));
        assert_eq!(format.text(), "image/jpeg");

        let decls = root.namespace_decls();
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[2], ("dc".to_string(), "http://purl.org/dc/elements/1.1/".to_string()));
    }

    #[test]
    fn decodes_entities_and_cdata() {
        let root = parse("<a t=\"&quot;x&quot;\">1 &lt; 2 &amp; &#x41;&#66;<![CDATA[<raw>]]></a>").unwrap();
        assert_eq!(root.attr("t"), Some("\"x\""));
        assert_eq!(root.text(), "1 < 2 & AB<raw>");
    }

    #[test]
    fn unknown_entities_are_kept() {
        assert_eq!(unescape("a &nbsp; b & c"), "a &nbsp; b & c");
    }

    #[test]
    fn mismatched_tags_are_errors() {
        let err = parse("<a><b></a></b>").unwrap_err();
        assert_eq!(err.code(), 14);
        assert!(parse("<a>").is_err());
        assert!(parse("<a b=c/>").is_err());
    }

    #[test]
    fn deep_nesting_is_refused() {
        let deep = "<a>".repeat(20_000);
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.code(), 14);
        assert!(err.to_string().contains("nested deeper"));

        let ok = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert_eq!(parse(&ok).unwrap().name, "a");
    }
}
