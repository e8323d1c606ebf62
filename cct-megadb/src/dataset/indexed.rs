use super::*;
use crate::common::*;

/// Options applied to image file names while indexing a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Collapse `.` and `..` components and duplicated separators.
    #[serde(default)]
    pub normalize_paths: bool,
    /// Literal substring replacements, applied in order.
    #[serde(default)]
    pub filename_replacements: IndexMap<String, String>,
}

/// A COCO Camera Traps database with lookup tables.
#[derive(Debug, Clone)]
pub struct IndexedDb {
    pub db: CctDatabase,
    pub cat_id_to_name: HashMap<usize, String>,
    pub cat_name_to_id: HashMap<String, usize>,
    pub filename_to_id: HashMap<String, String>,
    /// Image id to the index in the image list.
    image_index: IndexMap<String, usize>,
    /// Image id to the indexes in the annotation list, in file order.
    image_id_to_annotations: HashMap<String, Vec<usize>>,
}

impl IndexedDb {
    pub fn open(path: impl AsRef<Path>, options: &IndexOptions) -> Result<Self> {
        let path = path.as_ref();
        let db = CctDatabase::open(path)?;
        Self::new(db, options).with_context(|| format!("invalid database '{}'", path.display()))
    }

    pub fn new(mut db: CctDatabase, options: &IndexOptions) -> Result<Self> {
        let IndexOptions {
            normalize_paths,
            ref filename_replacements,
        } = *options;

        if normalize_paths {
            db.images.iter_mut().for_each(|image| {
                image.file_name = normalize_path(&image.file_name);
            });
        }

        filename_replacements.iter().for_each(|(from, to)| {
            db.images.iter_mut().for_each(|image| {
                image.file_name = image.file_name.replace(from.as_str(), to);
            });
        });

        let cat_id_to_name: HashMap<_, _> = db
            .categories
            .iter()
            .map(|cat| (cat.id, cat.name.clone()))
            .collect();
        let cat_name_to_id: HashMap<_, _> = db
            .categories
            .iter()
            .map(|cat| (cat.name.clone(), cat.id))
            .collect();
        let filename_to_id: HashMap<_, _> = db
            .images
            .iter()
            .map(|image| (image.file_name.clone(), image.id.clone()))
            .collect();

        let mut image_index = IndexMap::with_capacity(db.images.len());
        for (index, image) in db.images.iter().enumerate() {
            let prev = image_index.insert(image.id.clone(), index);
            ensure!(prev.is_none(), "duplicated image id '{}'", image.id);
        }

        // sanity check
        db.annotations.iter().try_for_each(|ann| {
            ensure!(
                cat_id_to_name.contains_key(&ann.category_id),
                "annotation '{}' refers to unknown category id {}",
                ann.id,
                ann.category_id
            );
            ensure!(
                image_index.contains_key(&ann.image_id),
                "annotation '{}' refers to unknown image id '{}'",
                ann.id,
                ann.image_id
            );
            Ok(())
        })?;

        let image_id_to_annotations: HashMap<_, _> = db
            .annotations
            .iter()
            .enumerate()
            .map(|(index, ann)| (ann.image_id.clone(), index))
            .into_group_map();

        Ok(Self {
            db,
            cat_id_to_name,
            cat_name_to_id,
            filename_to_id,
            image_index,
            image_id_to_annotations,
        })
    }

    /// Iterate over images in file order.
    pub fn images(&self) -> impl Iterator<Item = &CctImage> {
        self.db.images.iter()
    }

    pub fn num_images(&self) -> usize {
        self.db.images.len()
    }

    pub fn image(&self, image_id: &str) -> Option<&CctImage> {
        let index = *self.image_index.get(image_id)?;
        Some(&self.db.images[index])
    }

    /// Returns the annotations of an image, or an empty list if there are none.
    pub fn annotations_for_image(&self, image_id: &str) -> Vec<&CctAnnotation> {
        self.image_id_to_annotations
            .get(image_id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| &self.db.annotations[index])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the unique class names of an image, ordered by category id.
    pub fn classes_for_image(&self, image_id: &str) -> Result<Vec<String>> {
        self.annotations_for_image(image_id)
            .into_iter()
            .map(|ann| ann.category_id)
            .unique()
            .sorted()
            .map(|cat_id| self.category_name(cat_id).map(ToOwned::to_owned))
            .collect()
    }

    pub fn category_name(&self, category_id: usize) -> Result<&str> {
        self.cat_id_to_name
            .get(&category_id)
            .map(String::as_str)
            .ok_or_else(|| format_err!("unknown category id {}", category_id))
    }

    /// Unique class names of the annotations, sorted alphabetically.
    pub fn annotations_to_classnames<'a, I>(&self, annotations: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a CctAnnotation>,
    {
        let names: Vec<_> = annotations
            .into_iter()
            .map(|ann| self.category_name(ann.category_id))
            .try_collect()?;
        Ok(names
            .into_iter()
            .unique()
            .sorted()
            .map(ToOwned::to_owned)
            .collect())
    }

    /// Comma-joined form of [`annotations_to_classnames`](Self::annotations_to_classnames).
    pub fn annotations_to_string<'a, I>(&self, annotations: I) -> Result<String>
    where
        I: IntoIterator<Item = &'a CctAnnotation>,
    {
        Ok(self.annotations_to_classnames(annotations)?.join(","))
    }
}

/// Lexically normalize a POSIX path.
///
/// Backslashes are ordinary characters. Exactly two leading slashes are kept,
/// while three or more collapse to one.
fn normalize_path(path: &str) -> String {
    let prefix = if path.starts_with("//") && !path.starts_with("///") {
        "//"
    } else if path.starts_with('/') {
        "/"
    } else {
        ""
    };
    let mut parts: Vec<&str> = vec![];

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if !prefix.is_empty() => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if prefix.is_empty() && joined.is_empty() {
        ".".to_owned()
    } else {
        format!("{}{}", prefix, joined)
    }
}
