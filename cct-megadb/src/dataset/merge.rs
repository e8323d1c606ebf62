use super::*;
use crate::common::*;

/// Counters reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Images that existed only in the folded-in source.
    pub added: usize,
    /// Images present in both sources.
    pub amended: usize,
}

/// Combines record maps by image id.
///
/// The first source seen owns every field it defines. Later sources only fill
/// missing fields and append bounding boxes.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    records: RecordMap,
    stats: MergeStats,
}

impl Merger {
    pub fn new(base: RecordMap) -> Self {
        Self {
            records: base,
            stats: MergeStats::default(),
        }
    }

    pub fn fold(&mut self, other: RecordMap) {
        use indexmap::map::Entry;

        for (image_id, record) in other {
            match self.records.entry(image_id) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().absorb(record);
                    self.stats.amended += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(record);
                    self.stats.added += 1;
                }
            }
        }
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Compute relative boxes and return the merged records.
    pub fn finish(self) -> (RecordMap, MergeStats) {
        let Self {
            mut records,
            stats,
        } = self;

        records
            .values_mut()
            .for_each(|record| record.update_relative_boxes());

        (records, stats)
    }
}

/// Merge the species-labeled and box-labeled record maps.
pub fn merge_records(images: RecordMap, bboxes: RecordMap) -> (RecordMap, MergeStats) {
    let mut merger = Merger::new(images);
    merger.fold(bboxes);
    let (records, stats) = merger.finish();

    info!(
        "merged {} records, {} added and {} amended from bounding boxes",
        records.len(),
        stats.added,
        stats.amended
    );

    (records, stats)
}
