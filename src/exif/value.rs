use std::fmt;

use ::exif::{Rational, SRational, Value};

/// Byte order of a TIFF structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub(crate) fn from_little_endian(little: bool) -> Self {
        if little {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    pub(crate) fn is_little(self) -> bool {
        self == ByteOrder::Little
    }
}

/// TIFF field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TypeId {
    UnsignedByte = 1,
    AsciiString = 2,
    UnsignedShort = 3,
    UnsignedLong = 4,
    UnsignedRational = 5,
    SignedByte = 6,
    Undefined = 7,
    SignedShort = 8,
    SignedLong = 9,
    SignedRational = 10,
    TiffFloat = 11,
    TiffDouble = 12,
}

impl TypeId {
    pub fn name(self) -> &'static str {
        match self {
            TypeId::UnsignedByte => "Byte",
            TypeId::AsciiString => "Ascii",
            TypeId::UnsignedShort => "Short",
            TypeId::UnsignedLong => "Long",
            TypeId::UnsignedRational => "Rational",
            TypeId::SignedByte => "SByte",
            TypeId::Undefined => "Undefined",
            TypeId::SignedShort => "SShort",
            TypeId::SignedLong => "SLong",
            TypeId::SignedRational => "SRational",
            TypeId::TiffFloat => "Float",
            TypeId::TiffDouble => "Double",
        }
    }
}

/// A typed Exif value. Multi-component values keep every component.
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    Byte(Vec<u8>),
    /// Text without the trailing NUL.
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl ExifValue {
    pub fn type_id(&self) -> TypeId {
        match self {
            ExifValue::Byte(_) => TypeId::UnsignedByte,
            ExifValue::Ascii(_) => TypeId::AsciiString,
            ExifValue::Short(_) => TypeId::UnsignedShort,
            ExifValue::Long(_) => TypeId::UnsignedLong,
            ExifValue::Rational(_) => TypeId::UnsignedRational,
            ExifValue::SByte(_) => TypeId::SignedByte,
            ExifValue::Undefined(_) => TypeId::Undefined,
            ExifValue::SShort(_) => TypeId::SignedShort,
            ExifValue::SLong(_) => TypeId::SignedLong,
            ExifValue::SRational(_) => TypeId::SignedRational,
            ExifValue::Float(_) => TypeId::TiffFloat,
            ExifValue::Double(_) => TypeId::TiffDouble,
        }
    }

    /// Number of components as stored in the IFD entry.
    pub fn count(&self) -> usize {
        match self {
            ExifValue::Byte(v) | ExifValue::Undefined(v) => v.len(),
            ExifValue::Ascii(s) => s.len() + 1,
            ExifValue::Short(v) => v.len(),
            ExifValue::Long(v) => v.len(),
            ExifValue::Rational(v) => v.len(),
            ExifValue::SByte(v) => v.len(),
            ExifValue::SShort(v) => v.len(),
            ExifValue::SLong(v) => v.len(),
            ExifValue::SRational(v) => v.len(),
            ExifValue::Float(v) => v.len(),
            ExifValue::Double(v) => v.len(),
        }
    }

    /// Convert a value decoded by the TIFF reader. Fields of an unknown
    /// type come back as `None`.
    pub(crate) fn from_tiff(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Byte(v) => ExifValue::Byte(v.clone()),
            Value::Ascii(v) => {
                let text = v.first().map(Vec::as_slice).unwrap_or_default();
                ExifValue::Ascii(String::from_utf8_lossy(text).into_owned())
            }
            Value::Short(v) => ExifValue::Short(v.clone()),
            Value::Long(v) => ExifValue::Long(v.clone()),
            Value::Rational(v) => ExifValue::Rational(v.iter().map(|r| (r.num, r.denom)).collect()),
            Value::SByte(v) => ExifValue::SByte(v.clone()),
            Value::Undefined(v, _) => ExifValue::Undefined(v.clone()),
            Value::SShort(v) => ExifValue::SShort(v.clone()),
            Value::SLong(v) => ExifValue::SLong(v.clone()),
            Value::SRational(v) => ExifValue::SRational(v.iter().map(|r| (r.num, r.denom)).collect()),
            Value::Float(v) => ExifValue::Float(v.clone()),
            Value::Double(v) => ExifValue::Double(v.clone()),
            _ => return None,
        })
    }

    /// The value in the form the TIFF writer takes.
    pub(crate) fn to_tiff(&self) -> Value {
        match self {
            ExifValue::Byte(v) => Value::Byte(v.clone()),
            ExifValue::Ascii(s) => Value::Ascii(vec![s.as_bytes().to_vec()]),
            ExifValue::Short(v) => Value::Short(v.clone()),
            ExifValue::Long(v) => Value::Long(v.clone()),
            ExifValue::Rational(v) => {
                Value::Rational(v.iter().map(|&(num, denom)| Rational { num, denom }).collect())
            }
            ExifValue::SByte(v) => Value::SByte(v.clone()),
            ExifValue::Undefined(v) => Value::Undefined(v.clone(), 0),
            ExifValue::SShort(v) => Value::SShort(v.clone()),
            ExifValue::SLong(v) => Value::SLong(v.clone()),
            ExifValue::SRational(v) => {
                Value::SRational(v.iter().map(|&(num, denom)| SRational { num, denom }).collect())
            }
            ExifValue::Float(v) => Value::Float(v.clone()),
            ExifValue::Double(v) => Value::Double(v.clone()),
        }
    }

    /// Bytes of a tag that embeds another block (IPTC, XMP, ICC in TIFF
    /// files), as they sit in a file of byte order `order`.
    pub(crate) fn blob(&self, order: ByteOrder) -> Option<Vec<u8>> {
        match self {
            ExifValue::Byte(v) | ExifValue::Undefined(v) => Some(v.clone()),
            ExifValue::Long(v) => Some(
                v.iter()
                    .flat_map(|&x| match order {
                        ByteOrder::Little => x.to_le_bytes(),
                        ByteOrder::Big => x.to_be_bytes(),
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Render component `n` alone; `None` if out of range.
    ///
    /// ASCII values have a single component: the whole text.
    pub fn to_string_at(&self, n: usize) -> Option<String> {
        match self {
            ExifValue::Ascii(s) => (n == 0).then(|| s.clone()),
            ExifValue::Byte(v) | ExifValue::Undefined(v) => v.get(n).map(u8::to_string),
            ExifValue::SByte(v) => v.get(n).map(i8::to_string),
            ExifValue::Short(v) => v.get(n).map(u16::to_string),
            ExifValue::SShort(v) => v.get(n).map(i16::to_string),
            ExifValue::Long(v) => v.get(n).map(u32::to_string),
            ExifValue::SLong(v) => v.get(n).map(i32::to_string),
            ExifValue::Rational(v) => v.get(n).map(|(a, b)| format!("{a}/{b}")),
            ExifValue::SRational(v) => v.get(n).map(|(a, b)| format!("{a}/{b}")),
            ExifValue::Float(v) => v.get(n).map(f32::to_string),
            ExifValue::Double(v) => v.get(n).map(f64::to_string),
        }
    }

    fn components(&self) -> usize {
        match self {
            ExifValue::Ascii(_) => 1,
            other => other.count(),
        }
    }
}

/// Renders every component, space separated (`72/1`, `1 2 3 0`).
impl fmt::Display for ExifValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in 0..self.components() {
            if n > 0 {
                f.write_str(" ")?;
            }
            if let Some(s) = self.to_string_at(n) {
                f.write_str(&s)?;
            }
        }
        Ok(())
    }
}
