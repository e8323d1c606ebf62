use super::*;
use crate::common::*;

/// Records keyed by image id, in source order.
pub type RecordMap = IndexMap<String, ImageRecord>;

/// The dataset that produces one record per image.
pub trait RecordDataset {
    /// The indexed source database.
    fn index(&self) -> &IndexedDb;

    fn records(&self) -> &RecordMap;

    fn into_records(self) -> RecordMap;
}

/// Build a record carrying the image fields of a database entry.
pub(crate) fn image_to_record(image: &CctImage) -> ImageRecord {
    let CctImage {
        ref id,
        ref file_name,
        width,
        height,
        ref datetime,
        ref location,
        ref extra,
    } = *image;

    ImageRecord {
        file_name: Some(file_name.clone()),
        datetime: datetime.clone(),
        location: location.clone(),
        width,
        height,
        extra: extra.clone(),
        ..ImageRecord::new(id.clone())
    }
}
