use std::fmt;

/// An XMP property value.
#[derive(Debug, Clone, PartialEq)]
pub enum XmpValue {
    Text(String),
    /// Unordered array.
    Bag(Vec<String>),
    /// Ordered array.
    Seq(Vec<String>),
    /// Alternatives without language qualifiers.
    Alt(Vec<String>),
    /// Language alternatives as `(xml:lang, text)` pairs.
    LangAlt(Vec<(String, String)>),
}

impl XmpValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            XmpValue::Text(_) => "XmpText",
            XmpValue::Bag(_) => "XmpBag",
            XmpValue::Seq(_) => "XmpSeq",
            XmpValue::Alt(_) => "XmpAlt",
            XmpValue::LangAlt(_) => "LangAlt",
        }
    }

    pub fn count(&self) -> usize {
        match self {
            XmpValue::Text(_) => 1,
            XmpValue::Bag(v) | XmpValue::Seq(v) | XmpValue::Alt(v) => v.len(),
            XmpValue::LangAlt(v) => v.len(),
        }
    }

    /// The single-value rendering: the text, the first array item, or the
    /// `x-default` alternative (first one if there is no default).
    pub fn to_string_at(&self, n: usize) -> String {
        match self {
            XmpValue::Text(s) => s.clone(),
            XmpValue::Bag(v) | XmpValue::Seq(v) | XmpValue::Alt(v) => v.get(n).cloned().unwrap_or_default(),
            XmpValue::LangAlt(v) => v
                .iter()
                .find(|(lang, _)| lang == "x-default")
                .or_else(|| v.first())
                .map(|(_, text)| text.clone())
                .unwrap_or_default(),
        }
    }
}

/// Arrays render comma separated; language alternatives as `lang="..." text`.
impl fmt::Display for XmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmpValue::Text(s) => f.write_str(s),
            XmpValue::Bag(v) | XmpValue::Seq(v) | XmpValue::Alt(v) => f.write_str(&v.join(", ")),
            XmpValue::LangAlt(v) => {
                for (i, (lang, text)) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "lang=\"{lang}\" {text}")?;
                }
                Ok(())
            }
        }
    }
}
