//! The end-to-end migration steps.

use crate::{
    common::*,
    config::{Config, StoreConfig},
    dataset::{
        merge_records, BoundingBoxDataset, IdNormalizer, ImageMetadataDataset, ImageRecord,
        MergeStats, RecordDataset,
    },
    store::{insert_all, write_json, CosmosStore, DocumentStore, JsonFileStore, Query},
};

/// Load both databases, merge them and normalize ids.
pub fn build_records(config: &Config) -> Result<(Vec<ImageRecord>, MergeStats)> {
    let normalizer =
        IdNormalizer::with_substitutes(&config.dataset_name, config.reserved_chars.clone())?;

    info!("loading image database '{}'", config.image_db.display());
    let images = ImageMetadataDataset::load(&config.image_db, &config.index)?;
    info!("loaded {} images", images.records().len());

    info!("loading bounding box database '{}'", config.bbox_db.display());
    let bboxes = BoundingBoxDataset::load(&config.bbox_db, &config.index)?;
    info!("loaded {} images", bboxes.records().len());

    let (merged, stats) = merge_records(images.into_records(), bboxes.into_records());
    let records = normalizer.normalize_all(merged.into_iter().map(|(_, record)| record))?;

    Ok((records, stats))
}

/// Merge the databases and write the local output file.
pub fn merge(config: &Config) -> Result<Vec<ImageRecord>> {
    let (records, _) = build_records(config)?;
    write_json(&config.output.file, &records, config.output.sample_size)?;
    Ok(records)
}

/// Open the configured document store.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
    let store: Box<dyn DocumentStore> = match config {
        StoreConfig::Cosmos(cosmos) => Box::new(CosmosStore::new(cosmos)?),
        StoreConfig::JsonFile { path, page_size } => {
            Box::new(JsonFileStore::open(path, *page_size)?)
        }
    };
    Ok(store)
}

/// Merge the databases and insert the records, or the first `limit` of them.
pub fn upload(config: &Config, limit: Option<usize>) -> Result<usize> {
    let (records, _) = build_records(config)?;
    let records = match limit {
        Some(limit) => &records[..limit.min(records.len())],
        None => &records[..],
    };

    let mut store = open_store(&config.store)?;
    let count = insert_all(store.as_mut(), records)?;
    store.flush()?;
    Ok(count)
}

/// Run a read query against the configured store.
pub fn query(config: &Config, query: &Query) -> Result<Vec<ImageRecord>> {
    let store = open_store(&config.store)?;
    let records = store.query(query)?;
    info!("{}: found {} records", query, records.len());
    Ok(records)
}
