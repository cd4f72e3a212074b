use std::fmt;
use std::str::FromStr;

use super::value::TypeId;
use crate::error::{Error, Result};

/// The IFD an Exif tag lives in, named the way keys spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExifGroup {
    /// IFD0, the primary image.
    Image,
    /// The Exif sub-IFD.
    Photo,
    /// The interoperability sub-IFD.
    Iop,
    /// The GPS sub-IFD.
    GpsInfo,
    /// IFD1, the embedded thumbnail.
    Thumbnail,
}

impl ExifGroup {
    pub fn name(self) -> &'static str {
        match self {
            ExifGroup::Image => "Image",
            ExifGroup::Photo => "Photo",
            ExifGroup::Iop => "Iop",
            ExifGroup::GpsInfo => "GPSInfo",
            ExifGroup::Thumbnail => "Thumbnail",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Image" => ExifGroup::Image,
            "Photo" => ExifGroup::Photo,
            "Iop" => ExifGroup::Iop,
            "GPSInfo" => ExifGroup::GpsInfo,
            "Thumbnail" => ExifGroup::Thumbnail,
            _ => return None,
        })
    }

    fn table(self) -> &'static [TagInfo] {
        match self {
            ExifGroup::Image | ExifGroup::Thumbnail => IMAGE_TAGS,
            ExifGroup::Photo => PHOTO_TAGS,
            ExifGroup::Iop => IOP_TAGS,
            ExifGroup::GpsInfo => GPS_TAGS,
        }
    }
}

/// Static description of a known tag.
#[derive(Debug)]
pub struct TagInfo {
    pub tag: u16,
    pub name: &'static str,
    pub type_id: TypeId,
}

const fn t(tag: u16, name: &'static str, type_id: TypeId) -> TagInfo {
    TagInfo { tag, name, type_id }
}

use TypeId::{
    AsciiString as ASCII, SignedRational as SRATIONAL, UnsignedByte as BYTE, UnsignedLong as LONG,
    UnsignedRational as RATIONAL, UnsignedShort as SHORT, Undefined as UNDEF,
};

// Pointer tags, rewritten by the encoder.
pub(crate) const TAG_EXIF_IFD: u16 = 0x8769;
pub(crate) const TAG_GPS_IFD: u16 = 0x8825;
pub(crate) const TAG_INTEROP_IFD: u16 = 0xA005;
pub(crate) const TAG_JPEG_IF: u16 = 0x0201;
pub(crate) const TAG_JPEG_IF_LENGTH: u16 = 0x0202;
pub(crate) const TAG_XML_PACKET: u16 = 0x02BC;
pub(crate) const TAG_IPTC_NAA: u16 = 0x83BB;
pub(crate) const TAG_ICC_PROFILE: u16 = 0x8773;

static IMAGE_TAGS: &[TagInfo] = &[
    t(0x000b, "ProcessingSoftware", ASCII),
    t(0x00fe, "NewSubfileType", LONG),
    t(0x00ff, "SubfileType", SHORT),
    t(0x0100, "ImageWidth", LONG),
    t(0x0101, "ImageLength", LONG),
    t(0x0102, "BitsPerSample", SHORT),
    t(0x0103, "Compression", SHORT),
    t(0x0106, "PhotometricInterpretation", SHORT),
    t(0x010d, "DocumentName", ASCII),
    t(0x010e, "ImageDescription", ASCII),
    t(0x010f, "Make", ASCII),
    t(0x0110, "Model", ASCII),
    t(0x0111, "StripOffsets", LONG),
    t(0x0112, "Orientation", SHORT),
    t(0x0115, "SamplesPerPixel", SHORT),
    t(0x0116, "RowsPerStrip", LONG),
    t(0x0117, "StripByteCounts", LONG),
    t(0x011a, "XResolution", RATIONAL),
    t(0x011b, "YResolution", RATIONAL),
    t(0x011c, "PlanarConfiguration", SHORT),
    t(0x0128, "ResolutionUnit", SHORT),
    t(0x012d, "TransferFunction", SHORT),
    t(0x0131, "Software", ASCII),
    t(0x0132, "DateTime", ASCII),
    t(0x013b, "Artist", ASCII),
    t(0x013c, "HostComputer", ASCII),
    t(0x013e, "WhitePoint", RATIONAL),
    t(0x013f, "PrimaryChromaticities", RATIONAL),
    t(TAG_JPEG_IF, "JPEGInterchangeFormat", LONG),
    t(TAG_JPEG_IF_LENGTH, "JPEGInterchangeFormatLength", LONG),
    t(0x0211, "YCbCrCoefficients", RATIONAL),
    t(0x0212, "YCbCrSubSampling", SHORT),
    t(0x0213, "YCbCrPositioning", SHORT),
    t(0x0214, "ReferenceBlackWhite", RATIONAL),
    t(TAG_XML_PACKET, "XMLPacket", BYTE),
    t(0x4746, "Rating", SHORT),
    t(0x4749, "RatingPercent", SHORT),
    t(0x8298, "Copyright", ASCII),
    t(TAG_IPTC_NAA, "IPTCNAA", LONG),
    t(0x8649, "ImageResources", BYTE),
    t(TAG_EXIF_IFD, "ExifTag", LONG),
    t(TAG_ICC_PROFILE, "InterColorProfile", UNDEF),
    t(TAG_GPS_IFD, "GPSTag", LONG),
    t(0x9c9b, "XPTitle", BYTE),
    t(0x9c9c, "XPComment", BYTE),
    t(0x9c9d, "XPAuthor", BYTE),
    t(0x9c9e, "XPKeywords", BYTE),
    t(0x9c9f, "XPSubject", BYTE),
    t(0xc4a5, "PrintImageMatching", UNDEF),
    t(0xc612, "DNGVersion", BYTE),
];

static PHOTO_TAGS: &[TagInfo] = &[
    t(0x829a, "ExposureTime", RATIONAL),
    t(0x829d, "FNumber", RATIONAL),
    t(0x8822, "ExposureProgram", SHORT),
    t(0x8824, "SpectralSensitivity", ASCII),
    t(0x8827, "ISOSpeedRatings", SHORT),
    t(0x8828, "OECF", UNDEF),
    t(0x8830, "SensitivityType", SHORT),
    t(0x9000, "ExifVersion", UNDEF),
    t(0x9003, "DateTimeOriginal", ASCII),
    t(0x9004, "DateTimeDigitized", ASCII),
    t(0x9010, "OffsetTime", ASCII),
    t(0x9011, "OffsetTimeOriginal", ASCII),
    t(0x9012, "OffsetTimeDigitized", ASCII),
    t(0x9101, "ComponentsConfiguration", UNDEF),
    t(0x9102, "CompressedBitsPerPixel", RATIONAL),
    t(0x9201, "ShutterSpeedValue", SRATIONAL),
    t(0x9202, "ApertureValue", RATIONAL),
    t(0x9203, "BrightnessValue", SRATIONAL),
    t(0x9204, "ExposureBiasValue", SRATIONAL),
    t(0x9205, "MaxApertureValue", RATIONAL),
    t(0x9206, "SubjectDistance", RATIONAL),
    t(0x9207, "MeteringMode", SHORT),
    t(0x9208, "LightSource", SHORT),
    t(0x9209, "Flash", SHORT),
    t(0x920a, "FocalLength", RATIONAL),
    t(0x9214, "SubjectArea", SHORT),
    t(0x927c, "MakerNote", UNDEF),
    t(0x9286, "UserComment", UNDEF),
    t(0x9290, "SubSecTime", ASCII),
    t(0x9291, "SubSecTimeOriginal", ASCII),
    t(0x9292, "SubSecTimeDigitized", ASCII),
    t(0xa000, "FlashpixVersion", UNDEF),
    t(0xa001, "ColorSpace", SHORT),
    t(0xa002, "PixelXDimension", LONG),
    t(0xa003, "PixelYDimension", LONG),
    t(0xa004, "RelatedSoundFile", ASCII),
    t(TAG_INTEROP_IFD, "InteroperabilityTag", LONG),
    t(0xa20b, "FlashEnergy", RATIONAL),
    t(0xa20e, "FocalPlaneXResolution", RATIONAL),
    t(0xa20f, "FocalPlaneYResolution", RATIONAL),
    t(0xa210, "FocalPlaneResolutionUnit", SHORT),
    t(0xa214, "SubjectLocation", SHORT),
    t(0xa215, "ExposureIndex", RATIONAL),
    t(0xa217, "SensingMethod", SHORT),
    t(0xa300, "FileSource", UNDEF),
    t(0xa301, "SceneType", UNDEF),
    t(0xa302, "CFAPattern", UNDEF),
    t(0xa401, "CustomRendered", SHORT),
    t(0xa402, "ExposureMode", SHORT),
    t(0xa403, "WhiteBalance", SHORT),
    t(0xa404, "DigitalZoomRatio", RATIONAL),
    t(0xa405, "FocalLengthIn35mmFilm", SHORT),
    t(0xa406, "SceneCaptureType", SHORT),
    t(0xa407, "GainControl", SHORT),
    t(0xa408, "Contrast", SHORT),
    t(0xa409, "Saturation", SHORT),
    t(0xa40a, "Sharpness", SHORT),
    t(0xa40b, "DeviceSettingDescription", UNDEF),
    t(0xa40c, "SubjectDistanceRange", SHORT),
    t(0xa420, "ImageUniqueID", ASCII),
    t(0xa430, "CameraOwnerName", ASCII),
    t(0xa431, "BodySerialNumber", ASCII),
    t(0xa432, "LensSpecification", RATIONAL),
    t(0xa433, "LensMake", ASCII),
    t(0xa434, "LensModel", ASCII),
    t(0xa435, "LensSerialNumber", ASCII),
];

static GPS_TAGS: &[TagInfo] = &[
    t(0x0000, "GPSVersionID", BYTE),
    t(0x0001, "GPSLatitudeRef", ASCII),
    t(0x0002, "GPSLatitude", RATIONAL),
    t(0x0003, "GPSLongitudeRef", ASCII),
    t(0x0004, "GPSLongitude", RATIONAL),
    t(0x0005, "GPSAltitudeRef", BYTE),
    t(0x0006, "GPSAltitude", RATIONAL),
    t(0x0007, "GPSTimeStamp", RATIONAL),
    t(0x0008, "GPSSatellites", ASCII),
    t(0x0009, "GPSStatus", ASCII),
    t(0x000a, "GPSMeasureMode", ASCII),
    t(0x000b, "GPSDOP", RATIONAL),
    t(0x000c, "GPSSpeedRef", ASCII),
    t(0x000d, "GPSSpeed", RATIONAL),
    t(0x000e, "GPSTrackRef", ASCII),
    t(0x000f, "GPSTrack", RATIONAL),
    t(0x0010, "GPSImgDirectionRef", ASCII),
    t(0x0011, "GPSImgDirection", RATIONAL),
    t(0x0012, "GPSMapDatum", ASCII),
    t(0x0013, "GPSDestLatitudeRef", ASCII),
    t(0x0014, "GPSDestLatitude", RATIONAL),
    t(0x0015, "GPSDestLongitudeRef", ASCII),
    t(0x0016, "GPSDestLongitude", RATIONAL),
    t(0x0017, "GPSDestBearingRef", ASCII),
    t(0x0018, "GPSDestBearing", RATIONAL),
    t(0x0019, "GPSDestDistanceRef", ASCII),
    t(0x001a, "GPSDestDistance", RATIONAL),
    t(0x001b, "GPSProcessingMethod", UNDEF),
    t(0x001c, "GPSAreaInformation", UNDEF),
    t(0x001d, "GPSDateStamp", ASCII),
    t(0x001e, "GPSDifferential", SHORT),
];

static IOP_TAGS: &[TagInfo] = &[
    t(0x0001, "InteroperabilityIndex", ASCII),
    t(0x0002, "InteroperabilityVersion", UNDEF),
    t(0x1000, "RelatedImageFileFormat", ASCII),
    t(0x1001, "RelatedImageWidth", LONG),
    t(0x1002, "RelatedImageLength", LONG),
];

/// A parsed `Exif.<Group>.<TagName>` key.
///
/// Tags missing from the built-in tables are spelled `Exif.<Group>.0xNNNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExifKey {
    group: ExifGroup,
    tag: u16,
}

impl ExifKey {
    pub fn new(group: ExifGroup, tag: u16) -> Self {
        Self { group, tag }
    }

    pub fn group(&self) -> ExifGroup {
        self.group
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    fn info(&self) -> Option<&'static TagInfo> {
        self.group.table().iter().find(|i| i.tag == self.tag)
    }

    pub fn tag_name(&self) -> String {
        match self.info() {
            Some(info) => info.name.to_string(),
            None => format!("0x{:04x}", self.tag),
        }
    }

    /// The type the tag is normally stored as, if the tag is known.
    pub fn default_type(&self) -> Option<TypeId> {
        self.info().map(|i| i.type_id)
    }

    /// Comment-style tags carry an 8-byte character-set header.
    pub(crate) fn is_comment(&self) -> bool {
        matches!(
            (self.group, self.tag),
            (ExifGroup::Photo, 0x9286) | (ExifGroup::GpsInfo, 0x001b) | (ExifGroup::GpsInfo, 0x001c)
        )
    }
}

impl FromStr for ExifKey {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        let invalid = || Error::InvalidKey(key.to_string());

        let mut parts = key.splitn(3, '.');
        let (Some(family), Some(group), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        if family != "Exif" || name.is_empty() {
            return Err(invalid());
        }
        let group = ExifGroup::from_name(group).ok_or_else(invalid)?;

        if let Some(hex) = name.strip_prefix("0x") {
            let tag = u16::from_str_radix(hex, 16).map_err(|_| invalid())?;
            return Ok(ExifKey::new(group, tag));
        }

        group
            .table()
            .iter()
            .find(|i| i.name == name)
            .map(|i| ExifKey::new(group, i.tag))
            .ok_or_else(|| Error::InvalidTag {
                name: name.to_string(),
                group: group.name().to_string(),
            })
    }
}

impl fmt::Display for ExifKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exif.{}.{}", self.group.name(), self.tag_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let key: ExifKey = "Exif.Image.Make".parse().unwrap();
        assert_eq!(key.group(), ExifGroup::Image);
        assert_eq!(key.tag(), 0x010f);
        assert_eq!(key.to_string(), "Exif.Image.Make");

        let key: ExifKey = "Exif.Photo.UserComment".parse().unwrap();
        assert!(key.is_comment());
        assert_eq!(key.default_type(), Some(TypeId::Undefined));
    }

    #[test]
    fn thumbnail_group_shares_image_names() {
        let key: ExifKey = "Exif.Thumbnail.JPEGInterchangeFormat".parse().unwrap();
        assert_eq!(key.tag(), TAG_JPEG_IF);
        assert_eq!(key.to_string(), "Exif.Thumbnail.JPEGInterchangeFormat");
    }

    #[test]
    fn hex_names_round_trip() {
        let key: ExifKey = "Exif.Image.0xabcd".parse().unwrap();
        assert_eq!(key.tag(), 0xabcd);
        assert_eq!(key.to_string(), "Exif.Image.0xabcd");
        assert_eq!(key.default_type(), None);
    }

    #[test]
    fn bad_family_or_group_is_invalid_key() {
        for bad in ["NotARealKey", "Exif.Invalid.Key", "Iptc.Image.Make", "Exif.Image", "Exif.Image."] {
            let err = bad.parse::<ExifKey>().unwrap_err();
            assert_eq!(err.code(), 6, "{bad}");
            assert!(err.to_string().contains("Invalid key"));
        }
    }

    #[test]
    fn unknown_tag_name_is_invalid_tag() {
        let err = "Exif.Image.UserComment".parse::<ExifKey>().unwrap_err();
        assert_eq!(err.code(), 7);
        assert!(err.is_invalid_key());
    }
}
