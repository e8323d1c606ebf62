use super::*;
use crate::common::*;

/// The box-level database where each annotation carries a bounding box.
#[derive(Debug, Clone)]
pub struct BoundingBoxDataset {
    pub index: IndexedDb,
    pub records: RecordMap,
}

impl RecordDataset for BoundingBoxDataset {
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

impl BoundingBoxDataset {
    pub fn load(path: impl AsRef<Path>, options: &IndexOptions) -> Result<Self> {
        let index = IndexedDb::open(path, options)?;
        Self::from_index(index)
    }

    pub fn from_index(index: IndexedDb) -> Result<Self> {
        let mut num_boxless = 0;

        let records: RecordMap = index
            .images()
            .map(|image| -> Result<_> {
                let bboxes: Vec<_> = index
                    .annotations_for_image(&image.id)
                    .into_iter()
                    .filter_map(|ann| match &ann.bbox {
                        Some(bbox) => Some((ann, bbox)),
                        None => {
                            num_boxless += 1;
                            None
                        }
                    })
                    .map(|(ann, bbox)| -> Result<_> {
                        let category = index.category_name(ann.category_id)?;
                        Ok(BoundingBoxAnnotation::new(category, bbox.clone()))
                    })
                    .try_collect()
                    .with_context(|| format!("failed to label image '{}'", image.id))?;

                let mut record = image_to_record(image);
                record.annotations.bbox = bboxes;
                Ok((image.id.clone(), record))
            })
            .try_collect()?;

        if num_boxless > 0 {
            warn!("ignored {} annotations without bounding box", num_boxless);
        }

        Ok(Self { index, records })
    }
}
