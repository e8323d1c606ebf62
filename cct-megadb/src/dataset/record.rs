use crate::common::*;

/// Decimal places kept in relative bounding boxes.
pub const RELATIVE_BBOX_DECIMALS: i32 = 4;

/// The denormalized per-image record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    /// The partition attribute, attached on normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(default)]
    pub annotations: AnnotationBlock,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-image labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBlock {
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default)]
    pub bbox: Vec<BoundingBoxAnnotation>,
}

/// A labeled box on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxAnnotation {
    pub category: String,
    /// Absolute box in pixels.
    pub bbox: XYWH<f64>,
    /// The box in fractions of the image size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox_rel: Option<XYWH<f64>>,
}

impl BoundingBoxAnnotation {
    pub fn new(category: impl Into<String>, bbox: XYWH<f64>) -> Self {
        Self {
            category: category.into(),
            bbox,
            bbox_rel: None,
        }
    }

    /// Recompute the relative box for the image size, or drop it if the size is unknown.
    pub fn update_relative(&mut self, size: Option<&HW<f64>>) {
        self.bbox_rel = size
            .and_then(|size| self.bbox.to_relative(size))
            .map(|rel| rel.rounded(RELATIVE_BBOX_DECIMALS));
    }
}

impl ImageRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dataset: None,
            file_name: None,
            datetime: None,
            location: None,
            width: None,
            height: None,
            annotations: AnnotationBlock::default(),
            extra: Map::new(),
        }
    }

    /// The image size if both width and height are known and positive.
    pub fn size(&self) -> Option<HW<f64>> {
        HW::from_width_height(self.width, self.height).map(|size| size.cast())
    }

    /// Fold another record with the same id into this one.
    ///
    /// Fields already present here are kept. An empty species list counts as absent.
    /// Boxes of `other` are appended.
    pub fn absorb(&mut self, other: ImageRecord) {
        let ImageRecord {
            id: _,
            dataset,
            file_name,
            datetime,
            location,
            width,
            height,
            annotations: AnnotationBlock { species, bbox },
            extra,
        } = other;

        fill(&mut self.dataset, dataset);
        fill(&mut self.file_name, file_name);
        fill(&mut self.datetime, datetime);
        fill(&mut self.location, location);
        fill(&mut self.width, width);
        fill(&mut self.height, height);

        if self.annotations.species.is_empty() {
            self.annotations.species = species;
        }
        self.annotations.bbox.extend(bbox);

        extra.into_iter().for_each(|(key, value)| {
            self.extra.entry(key).or_insert(value);
        });
    }

    /// Recompute relative boxes from the current image size.
    pub fn update_relative_boxes(&mut self) {
        let size = self.size();
        self.annotations
            .bbox
            .iter_mut()
            .for_each(|bbox| bbox.update_relative(size.as_ref()));
    }
}

fn fill<T>(target: &mut Option<T>, source: Option<T>) {
    if target.is_none() {
        *target = source;
    }
}
