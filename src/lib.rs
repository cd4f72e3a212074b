//! # exiv-bridge
//!
//! Read and write Exif, IPTC and XMP image metadata from any language that can
//! call C. The library is built as a `cdylib` exposing a flat `extern "C"`
//! surface of opaque handles (see [`ffi`]), and as an `rlib` with the same
//! functionality behind a safe Rust API.
//!
//! ## Quick Start (Rust)
//!
//! ```rust,no_run
//! use exiv_bridge::image::Image;
//!
//! fn main() -> exiv_bridge::error::Result<()> {
//!     let mut image = Image::open("photo.jpg")?;
//!     image.read_metadata()?;
//!
//!     if let Some(make) = image.exif_data().get_string("Exif.Image.Make")? {
//!         println!("Camera: {make}");
//!     }
//!     for datum in image.xmp_data().iter() {
//!         println!("{} = {}", datum.key(), datum.render());
//!     }
//!
//!     // Writes straight through to photo.jpg
//!     image.set_iptc_string("Iptc.Application2.Caption", "Harbour at dusk")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Quick Start (C)
//!
//! ```c
//! Exiv2Error *err = NULL;
//! Exiv2Image *img = exiv2_image_factory_open("photo.jpg", &err);
//! exiv2_image_read_metadata(img, &err);
//!
//! Exiv2ExifData *exif = exiv2_image_get_exif_data(img);
//! Exiv2ExifDatum *make = exiv2_exif_data_find_key(exif, "Exif.Image.Make", &err);
//! if (make) {
//!     const char *s = exiv2_exif_datum_to_string(make);
//!     puts(s);
//!     free((void *)s);
//!     exiv2_exif_datum_free(make);
//! }
//! exiv2_exif_data_free(exif);
//! exiv2_image_free(img);
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Read | Write |
//! |--------|------|-------|
//! | JPEG | Exif, IPTC, XMP, ICC | Exif, IPTC |
//! | PNG | Exif, XMP, ICC | Exif |
//! | WebP | Exif, XMP, ICC | Exif |
//! | TIFF | Exif, IPTC, XMP, ICC | none |
//!
//! ## Modules
//!
//! - [`config`]: write-back configuration
//! - [`error`]: error type with stable numeric codes
//! - [`exif`], [`iptc`], [`xmp`]: keys, values and entry collections per domain
//! - [`image`]: opening images, reading and writing metadata
//! - [`iter`]: the forward cursor shared by all three domains
//! - [`ffi`]: the C surface

pub mod config;
pub mod error;
pub mod exif;
pub mod ffi;
pub mod image;
pub mod iptc;
pub mod iter;
pub mod xmp;

pub use crate::error::{Error, Result};
pub use crate::image::{Domain, Image, ImageKind};
