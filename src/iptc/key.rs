use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub(crate) const ENVELOPE: u16 = 1;
pub(crate) const APPLICATION2: u16 = 2;

/// How a dataset's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IptcType {
    Short,
    String,
    Date,
    Time,
    Undefined,
}

/// Static description of a known dataset.
#[derive(Debug)]
pub struct DataSetInfo {
    pub number: u16,
    pub name: &'static str,
    pub kind: IptcType,
}

const fn ds(number: u16, name: &'static str, kind: IptcType) -> DataSetInfo {
    DataSetInfo { number, name, kind }
}

use IptcType::{Date as DATE, Short as SHORT, String as STRING, Time as TIME, Undefined as UNDEF};

static ENVELOPE_SETS: &[DataSetInfo] = &[
    ds(0, "ModelVersion", SHORT),
    ds(5, "Destination", STRING),
    ds(20, "FileFormat", SHORT),
    ds(22, "FileVersion", SHORT),
    ds(30, "ServiceId", STRING),
    ds(40, "EnvelopeNumber", STRING),
    ds(50, "ProductId", STRING),
    ds(60, "EnvelopePriority", STRING),
    ds(70, "DateSent", DATE),
    ds(80, "TimeSent", TIME),
    ds(90, "CharacterSet", UNDEF),
    ds(100, "UNO", STRING),
    ds(120, "ARMId", SHORT),
    ds(122, "ARMVersion", SHORT),
];

static APPLICATION2_SETS: &[DataSetInfo] = &[
    ds(0, "RecordVersion", SHORT),
    ds(3, "ObjectType", STRING),
    ds(4, "ObjectAttribute", STRING),
    ds(5, "ObjectName", STRING),
    ds(7, "EditStatus", STRING),
    ds(8, "EditorialUpdate", STRING),
    ds(10, "Urgency", STRING),
    ds(12, "Subject", STRING),
    ds(15, "Category", STRING),
    ds(20, "SuppCategory", STRING),
    ds(22, "FixtureId", STRING),
    ds(25, "Keywords", STRING),
    ds(26, "LocationCode", STRING),
    ds(27, "LocationName", STRING),
    ds(30, "ReleaseDate", DATE),
    ds(35, "ReleaseTime", TIME),
    ds(37, "ExpirationDate", DATE),
    ds(38, "ExpirationTime", TIME),
    ds(40, "SpecialInstructions", STRING),
    ds(42, "ActionAdvised", STRING),
    ds(45, "ReferenceService", STRING),
    ds(47, "ReferenceDate", DATE),
    ds(50, "ReferenceNumber", STRING),
    ds(55, "DateCreated", DATE),
    ds(60, "TimeCreated", TIME),
    ds(62, "DigitizationDate", DATE),
    ds(63, "DigitizationTime", TIME),
    ds(65, "Program", STRING),
    ds(70, "ProgramVersion", STRING),
    ds(75, "ObjectCycle", STRING),
    ds(80, "Byline", STRING),
    ds(85, "BylineTitle", STRING),
    ds(90, "City", STRING),
    ds(92, "SubLocation", STRING),
    ds(95, "ProvinceState", STRING),
    ds(100, "CountryCode", STRING),
    ds(101, "CountryName", STRING),
    ds(103, "TransmissionReference", STRING),
    ds(105, "Headline", STRING),
    ds(110, "Credit", STRING),
    ds(115, "Source", STRING),
    ds(116, "Copyright", STRING),
    ds(118, "Contact", STRING),
    ds(120, "Caption", STRING),
    ds(122, "Writer", STRING),
    ds(125, "RasterizedCaption", UNDEF),
    ds(130, "ImageType", STRING),
    ds(131, "ImageOrientation", STRING),
    ds(135, "Language", STRING),
    ds(150, "AudioType", STRING),
    ds(151, "AudioRate", STRING),
    ds(152, "AudioResolution", STRING),
    ds(153, "AudioDuration", STRING),
    ds(154, "AudioOutcue", STRING),
    ds(200, "PreviewFormat", SHORT),
    ds(201, "PreviewVersion", SHORT),
    ds(202, "Preview", UNDEF),
];

fn record_name(record: u16) -> String {
    match record {
        ENVELOPE => "Envelope".to_string(),
        APPLICATION2 => "Application2".to_string(),
        other => format!("0x{other:04x}"),
    }
}

fn datasets(record: u16) -> &'static [DataSetInfo] {
    match record {
        ENVELOPE => ENVELOPE_SETS,
        APPLICATION2 => APPLICATION2_SETS,
        _ => &[],
    }
}

fn parse_hex(s: &str) -> Option<u16> {
    u16::from_str_radix(s.strip_prefix("0x")?, 16).ok()
}

/// A parsed `Iptc.<Record>.<DataSet>` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IptcKey {
    record: u16,
    dataset: u16,
}

impl IptcKey {
    pub fn new(record: u16, dataset: u16) -> Self {
        Self { record, dataset }
    }

    pub fn record(&self) -> u16 {
        self.record
    }

    pub fn dataset(&self) -> u16 {
        self.dataset
    }

    fn info(&self) -> Option<&'static DataSetInfo> {
        datasets(self.record).iter().find(|i| i.number == self.dataset)
    }

    pub fn record_name(&self) -> String {
        record_name(self.record)
    }

    pub fn dataset_name(&self) -> String {
        match self.info() {
            Some(info) => info.name.to_string(),
            None => format!("0x{:04x}", self.dataset),
        }
    }

    /// How the dataset is normally typed; unknown datasets are raw bytes.
    pub fn kind(&self) -> IptcType {
        self.info().map_or(IptcType::Undefined, |i| i.kind)
    }
}

impl FromStr for IptcKey {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        let mut parts = key.splitn(3, '.');
        let (Some(family), Some(record), Some(dataset)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::InvalidKey(key.to_string()));
        };
        if family != "Iptc" {
            return Err(Error::InvalidKey(key.to_string()));
        }

        let record = match record {
            "Envelope" => ENVELOPE,
            "Application2" => APPLICATION2,
            other => parse_hex(other).ok_or_else(|| Error::InvalidRecord(other.to_string()))?,
        };

        let dataset = datasets(record)
            .iter()
            .find(|i| i.name == dataset)
            .map(|i| i.number)
            .or_else(|| parse_hex(dataset))
            .ok_or_else(|| Error::InvalidDataset(dataset.to_string()))?;

        Ok(IptcKey::new(record, dataset))
    }
}

impl fmt::Display for IptcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iptc.{}.{}", self.record_name(), self.dataset_name())
    }
}
