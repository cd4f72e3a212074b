use std::fmt;

use super::key::IptcType;

/// A typed IPTC dataset value.
#[derive(Debug, Clone, PartialEq)]
pub enum IptcValue {
    Short(u16),
    String(String),
    /// `CCYYMMDD` on disk.
    Date { year: u16, month: u8, day: u8 },
    /// `HHMMSS±HHMM` on disk. `tz` is the UTC offset in minutes.
    Time { hour: u8, minute: u8, second: u8, tz: i16 },
    Undefined(Vec<u8>),
}

impl IptcValue {
    /// Interpret raw dataset bytes according to `kind`.
    ///
    /// Bytes that do not fit the expected shape are kept as text (or raw bytes
    /// for short values) rather than dropped.
    pub(crate) fn decode(kind: IptcType, data: &[u8]) -> Self {
        let parsed = match kind {
            IptcType::Short => <[u8; 2]>::try_from(data).ok().map(|b| IptcValue::Short(u16::from_be_bytes(b))),
            IptcType::Date => parse_date(data),
            IptcType::Time => parse_time(data),
            IptcType::String => Some(IptcValue::String(String::from_utf8_lossy(data).into_owned())),
            IptcType::Undefined => Some(IptcValue::Undefined(data.to_vec())),
        };
        parsed.unwrap_or_else(|| match kind {
            IptcType::Short => IptcValue::Undefined(data.to_vec()),
            _ => {
                log::debug!("Malformed IPTC {kind:?} value, keeping it as text");
                IptcValue::String(String::from_utf8_lossy(data).into_owned())
            }
        })
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            IptcValue::Short(v) => v.to_be_bytes().to_vec(),
            IptcValue::String(s) => s.as_bytes().to_vec(),
            IptcValue::Date { year, month, day } => format!("{year:04}{month:02}{day:02}").into_bytes(),
            IptcValue::Time { hour, minute, second, tz } => {
                let sign = if *tz < 0 { '-' } else { '+' };
                let tz = tz.unsigned_abs();
                format!("{hour:02}{minute:02}{second:02}{sign}{:02}{:02}", tz / 60, tz % 60).into_bytes()
            }
            IptcValue::Undefined(b) => b.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            IptcValue::Short(_) => "Short",
            IptcValue::String(_) => "String",
            IptcValue::Date { .. } => "Date",
            IptcValue::Time { .. } => "Time",
            IptcValue::Undefined(_) => "Undefined",
        }
    }
}

fn digits(data: &[u8]) -> Option<u32> {
    if data.is_empty() || !data.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(data).ok()?.parse().ok()
}

fn parse_date(data: &[u8]) -> Option<IptcValue> {
    if data.len() != 8 {
        return None;
    }
    let year = digits(&data[0..4])? as u16;
    let month = digits(&data[4..6])? as u8;
    let day = digits(&data[6..8])? as u8;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(IptcValue::Date { year, month, day })
}

fn parse_time(data: &[u8]) -> Option<IptcValue> {
    if data.len() != 6 && data.len() != 11 {
        return None;
    }
    let hour = digits(&data[0..2])? as u8;
    let minute = digits(&data[2..4])? as u8;
    let second = digits(&data[4..6])? as u8;
    if hour > 23 || minute > 59 || second > 60 {
        return None;
    }

    let tz = if data.len() == 11 {
        let sign = match data[6] {
            b'+' => 1,
            b'-' => -1,
            _ => return None,
        };
        let offset = digits(&data[7..9])? * 60 + digits(&data[9..11])?;
        sign * offset as i16
    } else {
        0
    };
    Some(IptcValue::Time { hour, minute, second, tz })
}

/// Renders dates as `YYYY-MM-DD` and times as `HH:MM:SS±HH:MM`.
impl fmt::Display for IptcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IptcValue::Short(v) => write!(f, "{v}"),
            IptcValue::String(s) => f.write_str(s),
            IptcValue::Date { year, month, day } => write!(f, "{year:04}-{month:02}-{day:02}"),
            IptcValue::Time { hour, minute, second, tz } => {
                let sign = if *tz < 0 { '-' } else { '+' };
                let tz = tz.unsigned_abs();
                write!(f, "{hour:02}:{minute:02}:{second:02}{sign}{:02}:{:02}", tz / 60, tz % 60)
            }
            IptcValue::Undefined(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_times_render_with_separators() {
        let date = IptcValue::decode(IptcType::Date, b"18481013");
        assert_eq!(date.to_string(), "1848-10-13");
        assert_eq!(date.encode(), b"18481013");

        let time = IptcValue::decode(IptcType::Time, b"124932+0100");
        assert_eq!(time.to_string(), "12:49:32+01:00");
        assert_eq!(time.encode(), b"124932+0100");

        let time = IptcValue::decode(IptcType::Time, b"235959-0530");
        assert_eq!(time.to_string(), "23:59:59-05:30");
    }

    #[test]
    fn time_without_zone_is_utc() {
        let time = IptcValue::decode(IptcType::Time, b"080000");
        assert_eq!(time.to_string(), "08:00:00+00:00");
    }

    #[test]
    fn malformed_values_fall_back() {
        assert_eq!(
            IptcValue::decode(IptcType::Date, b"2024-1-1"),
            IptcValue::String("2024-1-1".into())
        );
        assert_eq!(IptcValue::decode(IptcType::Short, &[1, 2, 3]), IptcValue::Undefined(vec![1, 2, 3]));
    }

    #[test]
    fn shorts_are_big_endian() {
        let v = IptcValue::decode(IptcType::Short, &[0, 4]);
        assert_eq!(v, IptcValue::Short(4));
        assert_eq!(v.to_string(), "4");
    }
}
