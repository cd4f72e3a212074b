//! Error types for exiv-bridge.
//!
//! Every variant carries a stable numeric code (see [`Error::code`]) so the
//! C surface can hand callers a `code + message` pair instead of a Rust type.
//! The numbering follows the classic exiv2 error list.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exiv-bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening images, reading or writing metadata.
#[derive(Debug, Error)]
pub enum Error {
    /// Free-form failure (configuration problems, caught panics).
    #[error("{0}")]
    General(String),

    /// The data claims a format but its structure does not match.
    #[error("This does not look like a {0} image")]
    NotAnImage(&'static str),

    /// Unknown IPTC dataset name.
    #[error("Invalid dataset name `{0}'")]
    InvalidDataset(String),

    /// Unknown IPTC record name.
    #[error("Invalid record name `{0}'")]
    InvalidRecord(String),

    /// Key does not have the `Family.Group.Name` shape of its domain.
    #[error("Invalid key `{0}'")]
    InvalidKey(String),

    /// Exif tag name unknown to the given group.
    #[error("Invalid tag name or ifdId `{name}', ifdId {group}")]
    InvalidTag {
        /// Tag name as given by the caller.
        name: String,
        /// Group (IFD) name the tag was looked up in.
        group: String,
    },

    /// The path could not be opened or read.
    #[error("{}: Failed to open the data source: {source}", .path.display())]
    DataSourceOpenFailed {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but its bytes are not a supported image.
    #[error("{}: The file contains data of an unknown image type", .0.display())]
    FileContainsUnknownImageType(PathBuf),

    /// An in-memory buffer is empty or not a supported image.
    #[error("The memory contains data of an unknown image type")]
    MemoryContainsUnknownImageType,

    /// A metadata block inside the image is corrupt.
    #[error("Failed to read image data: {0}")]
    FailedToReadImageData(String),

    /// Writing the updated image back to its file failed.
    #[error("{}: Failed to write image: {source}", .path.display())]
    ImageWriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A value could not be converted to the type required by its key.
    #[error("Cannot convert value for `{key}': {reason}")]
    InvalidValue {
        /// Metadata key being set.
        key: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// The format cannot carry the given metadata domain.
    #[error("Setting {domain} in {format} images is not supported")]
    UnsupportedSetting {
        /// Metadata domain, e.g. "IPTC metadata".
        domain: &'static str,
        /// Image format name.
        format: &'static str,
    },

    /// The format is read-only for this library.
    #[error("Writing to {0} images is not supported")]
    WritingUnsupported(&'static str),

    /// XMP key uses a prefix with no registered namespace.
    #[error("No namespace info available for XMP prefix `{0}'")]
    NoNamespaceForPrefix(String),
}

impl Error {
    /// Numeric error code, stable across releases.
    pub fn code(&self) -> i32 {
        match self {
            Error::General(_) => 1,
            Error::NotAnImage(_) => 3,
            Error::InvalidDataset(_) => 4,
            Error::InvalidRecord(_) => 5,
            Error::InvalidKey(_) => 6,
            Error::InvalidTag { .. } => 7,
            Error::DataSourceOpenFailed { .. } => 9,
            Error::FileContainsUnknownImageType(_) => 11,
            Error::MemoryContainsUnknownImageType => 12,
            Error::FailedToReadImageData(_) => 14,
            Error::ImageWriteFailed { .. } => 21,
            Error::InvalidValue { .. } => 25,
            Error::UnsupportedSetting { .. } => 32,
            Error::WritingUnsupported(_) => 33,
            Error::NoNamespaceForPrefix(_) => 36,
        }
    }

    /// True for the malformed-key family (codes 4, 5, 6, 7 and 36).
    pub fn is_invalid_key(&self) -> bool {
        matches!(
            self,
            Error::InvalidDataset(_)
                | Error::InvalidRecord(_)
                | Error::InvalidKey(_)
                | Error::InvalidTag { .. }
                | Error::NoNamespaceForPrefix(_)
        )
    }

    pub(crate) fn corrupt(what: impl Into<String>) -> Self {
        Error::FailedToReadImageData(what.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::General(format!("{err:#}"))
    }
}
