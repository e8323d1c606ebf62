//! Record sinks and document stores.

mod cosmos;
mod json_file;
mod query;

pub use cosmos::*;
pub use json_file::*;
pub use query::*;

use crate::{common::*, dataset::ImageRecord};

/// A document collection partitioned by dataset and keyed by image id.
pub trait DocumentStore {
    /// Insert one record. Fails if the record conflicts with a stored one.
    fn insert(&mut self, record: &ImageRecord) -> Result<()>;

    /// Run a query and collect all matching records.
    fn query(&self, query: &Query) -> Result<Vec<ImageRecord>>;

    /// Persist pending inserts.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Insert records one at a time, stopping at the first failure.
pub fn insert_all<S>(store: &mut S, records: &[ImageRecord]) -> Result<usize>
where
    S: DocumentStore + ?Sized,
{
    for (index, record) in records.iter().enumerate() {
        store
            .insert(record)
            .with_context(|| format!("failed to insert record '{}'", record.id))?;

        let count = index + 1;
        if count % 1000 == 0 {
            info!("inserted {}/{} records", count, records.len());
        }
    }

    info!("inserted {} records", records.len());
    Ok(records.len())
}

/// Write records as a JSON array, keeping only the first `limit` when set.
pub fn write_json(
    path: impl AsRef<Path>,
    records: &[ImageRecord],
    limit: Option<usize>,
) -> Result<usize> {
    let path = path.as_ref();
    let records = match limit {
        Some(limit) => &records[..limit.min(records.len())],
        None => records,
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    }

    let mut writer = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?,
    );
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;

    info!("wrote {} records to '{}'", records.len(), path.display());
    Ok(records.len())
}

/// Read a JSON array of records.
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<ImageRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?,
    );
    let records = serde_json::from_reader(reader)
        .with_context(|| format!("failed to parse records in '{}'", path.display()))?;
    Ok(records)
}
