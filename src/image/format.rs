/// Image container formats the bridge understands, detected from content.
///
/// # Example
///
/// ```rust
/// use exiv_bridge::image::ImageKind;
///
/// assert_eq!(ImageKind::detect(b"\xff\xd8\xff\xe0"), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::detect(b"GIF89a"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// JPEG: Exif, IPTC and XMP; Exif and IPTC writable
    Jpeg,
    /// PNG: Exif (eXIf) and XMP (iTXt); Exif writable
    Png,
    /// WebP: Exif and XMP RIFF chunks; Exif writable
    WebP,
    /// TIFF: the file is the Exif structure; read only
    Tiff,
}

impl ImageKind {
    /// Determine the kind from the leading bytes of the data.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else if data.starts_with(b"II\x2a\0") || data.starts_with(b"MM\0\x2a") {
            Some(Self::Tiff)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WebP",
            Self::Tiff => "TIFF",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }

    /// Whether IPTC datasets can be stored in this format.
    pub fn supports_iptc(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Tiff)
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Tiff)
    }
}
