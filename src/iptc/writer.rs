use super::reader::resources;
use super::{IptcData, IRB_IPTC_ID, IRB_SIGNATURE, PHOTOSHOP_HEADER};

/// Encode [`IptcData`] as an IPTC-IIM stream, datasets grouped by record.
pub(crate) fn encode(data: &IptcData) -> Vec<u8> {
    let mut sorted: Vec<_> = data.iter().collect();
    sorted.sort_by_key(|d| d.key.record());

    let mut out = Vec::new();
    for datum in sorted {
        let bytes = datum.value.encode();
        out.push(0x1C);
        out.push(datum.key.record() as u8);
        out.push(datum.key.dataset() as u8);
        if bytes.len() < 0x8000 {
            out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        } else {
            out.extend_from_slice(&0x8004u16.to_be_bytes());
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        }
        out.extend_from_slice(&bytes);
    }
    out
}

/// Build APP13 segment contents around a new IIM stream.
///
/// Existing `8BIM` resources are preserved; resource 0x0404 is replaced, or
/// dropped when `iim` is empty. Returns `None` if nothing would remain.
pub(crate) fn build_app13(existing: Option<&[u8]>, iim: &[u8]) -> Option<Vec<u8>> {
    let mut body = Vec::new();

    if let Some(data) = existing {
        for resource in resources(data).into_iter().filter(|r| r.id != IRB_IPTC_ID) {
            body.extend_from_slice(resource.raw);
        }
    }

    if !iim.is_empty() {
        body.extend_from_slice(IRB_SIGNATURE);
        body.extend_from_slice(&IRB_IPTC_ID.to_be_bytes());
        body.extend_from_slice(&[0, 0]); // empty pascal name, padded
        body.extend_from_slice(&(iim.len() as u32).to_be_bytes());
        body.extend_from_slice(iim);
        if iim.len() % 2 != 0 {
            body.push(0);
        }
    }

    if body.is_empty() {
        return None;
    }

    let mut result = Vec::with_capacity(PHOTOSHOP_HEADER.len() + body.len());
    result.extend_from_slice(PHOTOSHOP_HEADER);
    result.extend_from_slice(&body);
    Some(result)
}
