//! Shared shape of the three metadata domains, and the cursor that walks them.

use std::sync::Arc;

use crate::error::Result;

/// One key/value entry of a metadata domain.
pub trait Metadatum: Clone {
    /// Full key, e.g. `Iptc.Application2.Caption`.
    fn key(&self) -> String;

    /// The value as the C surface hands it out.
    fn render(&self) -> String;
}

/// An ordered collection of entries for one domain.
pub trait MetadataBlock {
    type Datum: Metadatum;

    fn entries(&self) -> &[Self::Datum];

    /// Exact-key lookup. Malformed keys are errors, absent ones are `Ok(None)`.
    fn find_key(&self, key: &str) -> Result<Option<&Self::Datum>>;
}

/// Single-pass forward cursor over a block.
///
/// The cursor holds its own reference to the block, so it stays valid after the
/// block handle it was created from is dropped. Once exhausted it stays exhausted.
#[derive(Debug)]
pub struct DatumIter<B> {
    block: Arc<B>,
    pos: usize,
}

impl<B: MetadataBlock> DatumIter<B> {
    pub fn new(block: Arc<B>) -> Self {
        Self { block, pos: 0 }
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.block.entries().len()
    }
}

impl<B: MetadataBlock> Iterator for DatumIter<B> {
    type Item = B::Datum;

    fn next(&mut self) -> Option<Self::Item> {
        let datum = self.block.entries().get(self.pos)?.clone();
        self.pos += 1;
        Some(datum)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.block.entries().len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl<B: MetadataBlock> std::iter::FusedIterator for DatumIter<B> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::ExifData;

    fn block() -> Arc<ExifData> {
        let mut data = ExifData::default();
        data.set_ascii("Exif.Image.Make", "FakeMake").unwrap();
        data.set_ascii("Exif.Image.Model", "FakeModel").unwrap();
        Arc::new(data)
    }

    #[test]
    fn walks_entries_in_order() {
        let keys: Vec<String> = DatumIter::new(block()).map(|d| Metadatum::key(&d)).collect();
        assert_eq!(keys, ["Exif.Image.Make", "Exif.Image.Model"]);
    }

    #[test]
    fn exhaustion_is_absorbing() {
        let mut it = DatumIter::new(block());
        assert!(it.has_next());
        assert!(it.next().is_some());
        assert!(it.next().is_some());
        assert!(!it.has_next());
        for _ in 0..3 {
            assert!(it.next().is_none());
            assert!(!it.has_next());
        }
    }

    #[test]
    fn empty_block_starts_exhausted() {
        let mut it = DatumIter::new(Arc::new(ExifData::default()));
        assert!(!it.has_next());
        assert!(it.next().is_none());
    }

    #[test]
    fn outlives_the_callers_block_reference() {
        let shared = block();
        let mut it = DatumIter::new(Arc::clone(&shared));
        drop(shared);
        assert_eq!(it.next().map(|d| d.render()).as_deref(), Some("FakeMake"));
    }
}
