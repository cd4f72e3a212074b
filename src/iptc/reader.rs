use super::key::IptcKey;
use super::value::IptcValue;
use super::{IptcData, Iptcdatum, IRB_SIGNATURE, IRB_IPTC_ID, PHOTOSHOP_HEADER};
use crate::error::{Error, Result};

const MARKER: u8 = 0x1C;

/// Decode an IPTC-IIM stream into [`IptcData`].
///
/// Bytes between datasets that are not a tag marker are skipped. A dataset whose
/// length runs past the end of the stream is an error.
pub(crate) fn decode(iim: &[u8]) -> Result<IptcData> {
    let mut data = IptcData::default();
    let mut pos = 0;

    while pos < iim.len() {
        if iim[pos] != MARKER {
            pos += 1;
            continue;
        }
        let header = iim
            .get(pos + 1..pos + 5)
            .ok_or_else(|| Error::corrupt("truncated IPTC dataset header"))?;
        let record = header[0] as u16;
        let dataset = header[1] as u16;
        let mut len = u16::from_be_bytes([header[2], header[3]]) as usize;
        pos += 5;

        // Extended dataset: the low bits give the width of the real length field.
        if len & 0x8000 != 0 {
            let width = len & 0x7fff;
            if width > 4 {
                return Err(Error::corrupt("IPTC extended length too wide"));
            }
            let bytes = iim
                .get(pos..pos + width)
                .ok_or_else(|| Error::corrupt("truncated IPTC extended length"))?;
            len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            pos += width;
        }

        let bytes = iim
            .get(pos..pos.saturating_add(len))
            .ok_or_else(|| Error::corrupt("IPTC dataset runs past end of data"))?;
        pos += len;

        let key = IptcKey::new(record, dataset);
        data.push(Iptcdatum::new(key, IptcValue::decode(key.kind(), bytes)));
    }

    Ok(data)
}

/// One Photoshop image resource block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resource<'a> {
    pub id: u16,
    /// The whole block, signature to padding, for verbatim copying.
    pub raw: &'a [u8],
    pub data: &'a [u8],
}

/// Walk the `8BIM` resources of an APP13 payload (with or without the
/// `Photoshop 3.0\0` header). Stops quietly at the first malformed block.
pub(crate) fn resources(app13: &[u8]) -> Vec<Resource<'_>> {
    let data = app13.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(app13);
    let mut out = Vec::new();
    let mut pos = 0;

    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != IRB_SIGNATURE {
            break;
        }
        let id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        // Pascal name: length byte + text, padded to even.
        let name_len = data[pos + 6] as usize;
        let name_padded = (name_len + 1) + (name_len + 1) % 2;
        let size_at = pos + 6 + name_padded;
        let Some(size_bytes) = data.get(size_at..size_at + 4) else {
            break;
        };
        let size = u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]]) as usize;
        let start = size_at + 4;
        let Some(payload) = data.get(start..start.saturating_add(size)) else {
            log::warn!("Photoshop resource 0x{id:04x} runs past end of segment");
            break;
        };
        let end = (start + size + size % 2).min(data.len());
        out.push(Resource {
            id,
            raw: &data[pos..end],
            data: payload,
        });
        pos = end;
    }

    out
}

/// The IPTC-IIM payload (resource 0x0404) of an APP13 segment, if any.
pub(crate) fn find_iim(app13: &[u8]) -> Option<&[u8]> {
    resources(app13)
        .into_iter()
        .find(|r| r.id == IRB_IPTC_ID)
        .map(|r| r.data)
}
