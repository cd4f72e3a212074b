//! Opened images: the byte resource plus the metadata read from it.
//!
//! An [`Image`] owns a copy of the file (or buffer) contents. Metadata is
//! parsed on [`Image::read_metadata`] and written back with
//! [`Image::write_metadata`], which rewrites the container and, for
//! file-backed images, the file itself.

pub(crate) mod container;
mod format;

pub use format::ImageKind;

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::NamedTempFile;

use self::container::Update;
use crate::config::{Config, WriteConfig};
use crate::error::{Error, Result};
use crate::exif::{self, ExifData};
use crate::iptc::{self, IptcData};
use crate::xmp::{self, XmpData};

/// Writable metadata domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Exif,
    Iptc,
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exif" => Ok(Domain::Exif),
            "iptc" => Ok(Domain::Iptc),
            _ => Err(Error::General(format!("Unknown metadata domain `{s}'"))),
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Memory,
}

/// Metadata exactly as last read from or written to the resource. Domains
/// equal to their snapshot are left untouched on write.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    exif: ExifData,
    iptc: IptcData,
}

#[derive(Debug)]
pub struct Image {
    source: Source,
    kind: ImageKind,
    io: Vec<u8>,
    config: Config,
    metadata_read: bool,
    exif: ExifData,
    iptc: IptcData,
    xmp: XmpData,
    snapshot: Snapshot,
    // The Exif block is present but could not be decoded.
    exif_unreadable: bool,
    icc: Option<Vec<u8>>,
    pixel_width: u32,
    pixel_height: u32,
    backed_up: bool,
}

impl Image {
    /// Open an image file with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref();
        let io = fs::read(path).map_err(|source| Error::DataSourceOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let kind = ImageKind::detect(&io).ok_or_else(|| Error::FileContainsUnknownImageType(path.to_path_buf()))?;
        log::debug!("Opened {} ({}, {} bytes)", path.display(), kind.name(), io.len());
        Ok(Self::new(Source::File(path.to_path_buf()), kind, io, config))
    }

    /// Open an image from memory. The bytes are copied; the caller keeps
    /// ownership of `data`.
    pub fn open_bytes(data: &[u8]) -> Result<Self> {
        let kind = ImageKind::detect(data).ok_or(Error::MemoryContainsUnknownImageType)?;
        log::debug!("Opened in-memory {} ({} bytes)", kind.name(), data.len());
        Ok(Self::new(Source::Memory, kind, data.to_vec(), Config::default()))
    }

    fn new(source: Source, kind: ImageKind, io: Vec<u8>, config: Config) -> Self {
        Self {
            source,
            kind,
            io,
            config,
            metadata_read: false,
            exif: ExifData::default(),
            iptc: IptcData::default(),
            xmp: XmpData::default(),
            snapshot: Snapshot::default(),
            exif_unreadable: false,
            icc: None,
            pixel_width: 0,
            pixel_height: 0,
            backed_up: false,
        }
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// The file the image was opened from, `None` for in-memory images.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            Source::Memory => None,
        }
    }

    pub fn write_config(&self) -> &WriteConfig {
        &self.config.write
    }

    /// Parse every metadata domain from the current bytes.
    ///
    /// Domains are decoded independently: a corrupt block leaves that domain
    /// empty, the others are still loaded, and the first failure is returned.
    /// A corrupt Exif block is never overwritten by [`Image::set_exif_string`].
    pub fn read_metadata(&mut self) -> Result<()> {
        self.metadata_read = true;
        self.exif = ExifData::default();
        self.iptc = IptcData::default();
        self.xmp = XmpData::default();
        self.snapshot = Snapshot::default();
        self.exif_unreadable = false;
        self.icc = None;

        (self.pixel_width, self.pixel_height) = match dimensions(&self.io) {
            Ok(dims) => dims,
            Err(e) => {
                log::warn!("Could not read pixel dimensions: {e}");
                (0, 0)
            }
        };

        let raw = container::extract(self.kind, &self.io)?;

        let mut first_error = None;
        let mut note = |domain: &str, err: Error| {
            log::warn!("Failed to read {domain} metadata: {err}");
            first_error.get_or_insert(err);
        };

        if let Some(tiff) = raw.exif.filter(|b| !b.is_empty()) {
            match exif::reader::decode(&tiff) {
                Ok(data) => self.exif = data,
                Err(e) => {
                    self.exif_unreadable = true;
                    note("Exif", e);
                }
            }
        }
        if let Some(iim) = raw.iim {
            match iptc::reader::decode(&iim) {
                Ok(data) => self.iptc = data,
                Err(e) => note("IPTC", e),
            }
        }
        if let Some(packet) = raw.xmp {
            match xmp::reader::decode(&packet) {
                Ok(data) => self.xmp = data,
                Err(e) => note("XMP", e),
            }
        }
        self.icc = raw.icc;

        self.snapshot = Snapshot {
            exif: self.exif.clone(),
            iptc: self.iptc.clone(),
        };
        log::debug!(
            "Read metadata: {} Exif, {} IPTC, {} XMP entries",
            self.exif.len(),
            self.iptc.len(),
            self.xmp.len()
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn exif_data(&self) -> &ExifData {
        &self.exif
    }

    pub fn iptc_data(&self) -> &IptcData {
        &self.iptc
    }

    pub fn xmp_data(&self) -> &XmpData {
        &self.xmp
    }

    /// Replace the Exif data to be written by the next [`Image::write_metadata`].
    pub fn set_exif_data(&mut self, data: ExifData) {
        self.exif = data;
    }

    pub fn set_iptc_data(&mut self, data: IptcData) {
        self.iptc = data;
    }

    /// Write changed Exif and IPTC data back to the resource.
    ///
    /// For file-backed images the file is rewritten first (atomically unless
    /// configured otherwise); the in-memory bytes change only once that succeeds.
    pub fn write_metadata(&mut self) -> Result<()> {
        self.commit(self.exif.clone(), self.iptc.clone())
    }

    /// Write `exif_data` and `iptc_data` through, then adopt them. On error nothing
    /// but the backup flag changes.
    fn commit(&mut self, exif_data: ExifData, iptc_data: IptcData) -> Result<()> {
        let exif_changed = exif_data != self.snapshot.exif;
        let iptc_changed = iptc_data != self.snapshot.iptc;
        if !self.kind.is_writable() {
            return Err(Error::WritingUnsupported(self.kind.name()));
        }
        if !exif_changed && !iptc_changed {
            log::debug!("No metadata changes to write");
            (self.exif, self.iptc) = (exif_data, iptc_data);
            return Ok(());
        }

        let update = Update {
            exif: exif_changed.then(|| exif::writer::encode(&exif_data)).transpose()?,
            iim: iptc_changed.then(|| iptc::writer::encode(&iptc_data)),
        };
        let updated = container::apply(self.kind, &self.io, update)?;

        if let Source::File(path) = self.source.clone() {
            self.persist(&path, &updated)?;
            log::info!("Metadata written to {}", path.display());
        }

        self.io = updated;
        self.snapshot = Snapshot {
            exif: exif_data.clone(),
            iptc: iptc_data.clone(),
        };
        (self.exif, self.iptc) = (exif_data, iptc_data);
        Ok(())
    }

    fn persist(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        let write_err = |source: std::io::Error| Error::ImageWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if self.config.write.backup_originals && !self.backed_up {
            backup_file(path).map_err(write_err)?;
            self.backed_up = true;
        }

        if !self.config.write.atomic {
            return fs::write(path, bytes).map_err(write_err);
        }

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let permissions = fs::metadata(path).map_err(write_err)?.permissions();
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn ensure_metadata_read(&mut self) -> Result<()> {
        if !self.metadata_read {
            self.read_metadata()?;
        }
        Ok(())
    }

    /// Set one Exif tag to an ASCII string and write the result through.
    ///
    /// On any failure the image, in memory and on disk, is left as it was.
    /// Refused when the image's Exif block could not be decoded, since the
    /// write would replace it with the single new tag.
    pub fn set_exif_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_metadata_read()?;
        if self.exif_unreadable {
            return Err(Error::corrupt("the Exif block could not be decoded, refusing to overwrite it"));
        }
        let mut exif = self.exif.clone();
        exif.set_ascii(key, value)?;
        self.commit(exif, self.iptc.clone())
    }

    /// Set one IPTC dataset to a string and write the result through.
    pub fn set_iptc_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_metadata_read()?;
        let mut iptc = self.iptc.clone();
        iptc.set_string(key, value)?;
        self.commit(self.exif.clone(), iptc)
    }

    pub fn set_metadata_string(&mut self, domain: Domain, key: &str, value: &str) -> Result<()> {
        match domain {
            Domain::Exif => self.set_exif_string(key, value),
            Domain::Iptc => self.set_iptc_string(key, value),
        }
    }

    pub fn io_size(&self) -> usize {
        self.io.len()
    }

    pub fn io_bytes(&self) -> &[u8] {
        &self.io
    }

    /// Width in pixels, 0 until metadata has been read.
    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc.as_deref()
    }
}

fn dimensions(data: &[u8]) -> ::image::ImageResult<(u32, u32)> {
    ::image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()
}

/// Copy `path` to `<name>.<ext>.bak` unless that backup already exists.
fn backup_file(path: &Path) -> std::io::Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        fs::copy(path, &backup_path)?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}
