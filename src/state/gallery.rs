/// In-memory gallery of saved polaroids
///
/// Lives only as long as the process; nothing is written to disk.

use super::data::{PolaroidId, PolaroidRecord};

/// The Gallery keeps saved polaroids, most recent first.
/// Records are immutable once added; the only mutation is removal by id
/// (or eviction of the oldest when a capacity is configured).
#[derive(Debug, Default)]
pub struct GalleryStore {
    records: Vec<PolaroidRecord>,
    capacity: Option<usize>,
}

impl GalleryStore {
    /// Unbounded gallery
    pub fn new() -> Self {
        Self::default()
    }

    /// Gallery that evicts its oldest record beyond `capacity`
    /// (`None` = unbounded, `Some(0)` is treated as 1)
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            capacity: capacity.map(|c| c.max(1)),
        }
    }

    /// Insert at the front. Returns the evicted record, if any.
    pub fn append(&mut self, record: PolaroidRecord) -> Option<PolaroidRecord> {
        tracing::debug!(id = %record.id, filter = %record.filter, "gallery append");
        self.records.insert(0, record);
        match self.capacity {
            Some(cap) if self.records.len() > cap => self.records.pop(),
            _ => None,
        }
    }

    /// Delete by id; absent ids are a no-op returning `None`
    pub fn remove(&mut self, id: PolaroidId) -> Option<PolaroidRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        tracing::debug!(%id, "gallery remove");
        Some(self.records.remove(index))
    }

    /// Read-only view, most recent first
    pub fn list(&self) -> &[PolaroidRecord] {
        &self.records
    }

    pub fn get(&self, id: PolaroidId) -> Option<&PolaroidRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturedImage;
    use crate::filters::FilterKind;
    use chrono::Utc;
    use image::{Rgb, RgbImage};

    fn record(caption: &str) -> PolaroidRecord {
        PolaroidRecord {
            id: PolaroidId::new(),
            image: CapturedImage::from_rgb_jpeg(&RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])), 90).unwrap(),
            caption: caption.to_string(),
            filter: FilterKind::Normal,
            created_at: Utc::now(),
        }
    }

    fn captions(store: &GalleryStore) -> Vec<&str> {
        store.list().iter().map(|r| r.caption.as_str()).collect()
    }

    #[test]
    fn test_most_recent_first() {
        let mut store = GalleryStore::new();
        store.append(record("A"));
        store.append(record("B"));
        assert_eq!(captions(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = GalleryStore::new();
        let a = record("A");
        let a_id = a.id;
        store.append(a);
        store.append(record("B"));

        assert_eq!(store.remove(a_id).map(|r| r.caption), Some("A".to_string()));
        assert_eq!(captions(&store), vec!["B"]);
        // second removal is a no-op
        assert!(store.remove(a_id).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_no_dedup() {
        let mut store = GalleryStore::new();
        store.append(record("same"));
        store.append(record("same"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = GalleryStore::with_capacity(Some(2));
        assert!(store.append(record("A")).is_none());
        assert!(store.append(record("B")).is_none());
        let evicted = store.append(record("C")).unwrap();
        assert_eq!(evicted.caption, "A");
        assert_eq!(captions(&store), vec!["C", "B"]);
        assert_eq!(store.capacity(), Some(2));
    }

    #[test]
    fn test_get() {
        let mut store = GalleryStore::new();
        let r = record("find me");
        let id = r.id;
        store.append(r);
        assert_eq!(store.get(id).unwrap().caption, "find me");
        assert!(store.get(PolaroidId::new()).is_none());
    }
}
