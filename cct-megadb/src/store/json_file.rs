use super::*;
use crate::{common::*, dataset::ImageRecord};

/// A document store backed by a local JSON array file.
///
/// Inserts are kept in memory until [`save`](JsonFileStore::save) is called.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<ImageRecord>,
    keys: HashSet<(Option<String>, String)>,
    page_size: usize,
}

impl JsonFileStore {
    /// Open the file, or start empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        ensure!(page_size > 0, "page_size must be positive");

        let path = path.as_ref().to_owned();
        let records = if path.exists() {
            read_json(&path)?
        } else {
            vec![]
        };

        let mut store = Self {
            path,
            records: Vec::with_capacity(records.len()),
            keys: HashSet::new(),
            page_size,
        };
        records
            .into_iter()
            .try_for_each(|record| store.push(record))?;

        debug!(
            "opened '{}' with {} records",
            store.path.display(),
            store.records.len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over matching records one page at a time.
    pub fn query_pages<'a>(
        &'a self,
        query: &'a Query,
    ) -> impl Iterator<Item = Vec<ImageRecord>> + 'a {
        let matched: Vec<_> = self
            .records
            .iter()
            .filter(|record| query.matches(record))
            .collect();
        let pages: Vec<Vec<ImageRecord>> = matched
            .chunks(self.page_size)
            .map(|page| page.iter().map(|&record| record.clone()).collect())
            .collect();
        pages.into_iter()
    }

    /// Write all records back to the file.
    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.records, None)?;
        Ok(())
    }

    fn push(&mut self, record: ImageRecord) -> Result<()> {
        let key = (record.dataset.clone(), record.id.clone());
        ensure!(
            !self.keys.contains(&key),
            "record '{}' already exists in partition {:?}",
            record.id,
            record.dataset
        );
        self.keys.insert(key);
        self.records.push(record);
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn insert(&mut self, record: &ImageRecord) -> Result<()> {
        self.push(record.clone())
    }

    fn query(&self, query: &Query) -> Result<Vec<ImageRecord>> {
        let mut num_pages = 0;
        let records: Vec<_> = self
            .query_pages(query)
            .inspect(|_| num_pages += 1)
            .flatten()
            .collect();
        debug!(
            "{}: {} records in {} pages",
            query,
            records.len(),
            num_pages
        );
        Ok(records)
    }

    fn flush(&mut self) -> Result<()> {
        self.save()
    }
}
