use super::*;
use crate::common::*;

/// The image-level database where each image is labeled with species.
#[derive(Debug, Clone)]
pub struct ImageMetadataDataset {
    pub index: IndexedDb,
    pub records: RecordMap,
}

impl RecordDataset for ImageMetadataDataset {
    fn index(&self) -> &IndexedDb {
        &self.index
    }

    fn records(&self) -> &RecordMap {
        &self.records
    }

    fn into_records(self) -> RecordMap {
        self.records
    }
}

impl ImageMetadataDataset {
    pub fn load(path: impl AsRef<Path>, options: &IndexOptions) -> Result<Self> {
        let index = IndexedDb::open(path, options)?;
        Self::from_index(index)
    }

    pub fn from_index(index: IndexedDb) -> Result<Self> {
        let records: RecordMap = index
            .images()
            .map(|image| -> Result<_> {
                let species = index
                    .annotations_to_classnames(index.annotations_for_image(&image.id))
                    .with_context(|| format!("failed to label image '{}'", image.id))?;

                let mut record = image_to_record(image);
                record.annotations.species = species;
                Ok((image.id.clone(), record))
            })
            .try_collect()?;

        let num_unlabeled = records
            .values()
            .filter(|record| record.annotations.species.is_empty())
            .count();
        if num_unlabeled > 0 {
            debug!("{} images have no species annotation", num_unlabeled);
        }

        Ok(Self { index, records })
    }
}
