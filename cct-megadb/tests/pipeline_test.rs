use anyhow::Result;
use approx::assert_abs_diff_eq;
use bbox::prelude::*;
use cct_megadb::{
    config::{Config, OutputConfig, StoreConfig},
    dataset::{ImageRecord, IndexOptions},
    pipeline,
    store::{read_json, Query},
};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    static ref DATA_DIR: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data");
}

const FIRST_ID: &str = "Beaverhead_elk~AM34~Trip 1~100RECNX~2016-01-12 08-00-00 T";
const SECOND_ID: &str = "Beaverhead_elk~AM34~Trip 1~100RECNX~2016-01-12 08-00-05 T";
const THIRD_ID: &str = "Clearwater~CW01~IMG_0001";
const BBOX_ONLY_ID: &str = "Beaverhead_elk~AM34~Trip 2~101RECNX~2016-02-01 10-00-00 T";

fn config(dir: &Path, sample_size: Option<usize>) -> Config {
    Config {
        dataset_name: "idfg".into(),
        image_db: DATA_DIR.join("image_db.json"),
        bbox_db: DATA_DIR.join("bbox_db.json"),
        index: IndexOptions::default(),
        reserved_chars: IndexMap::new(),
        output: OutputConfig {
            file: dir.join("out").join("records.json"),
            sample_size,
        },
        store: StoreConfig::JsonFile {
            path: dir.join("store.json"),
            page_size: 2,
        },
    }
}

fn ids(records: &[ImageRecord]) -> Vec<&str> {
    records.iter().map(|record| record.id.as_str()).collect()
}

#[test]
fn merge_fixture_databases() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path(), None);

    let (records, stats) = pipeline::build_records(&config)?;
    assert_eq!(ids(&records), vec![FIRST_ID, SECOND_ID, THIRD_ID, BBOX_ONLY_ID]);
    assert_eq!((stats.added, stats.amended), (1, 1));

    let first = &records[0];
    assert_eq!(first.dataset.as_deref(), Some("idfg"));
    assert_eq!(first.location.as_deref(), Some("AM34"));
    assert_eq!((first.width, first.height), (Some(2048), Some(1536)));
    assert_eq!(first.extra["seq_id"], "seq-1");
    assert_eq!(first.annotations.species, vec!["elk"]);
    assert_eq!(first.annotations.bbox.len(), 2);

    let rel = first.annotations.bbox[0].bbox_rel.as_ref().unwrap().xywh();
    for (value, expect) in rel.iter().zip([0.0488, 0.0326, 0.0977, 0.0977]) {
        assert_abs_diff_eq!(*value, expect);
    }
    let rel = first.annotations.bbox[1].bbox_rel.as_ref().unwrap().xywh();
    for (value, expect) in rel.iter().zip([0.5, 0.5, 0.25, 0.25]) {
        assert_abs_diff_eq!(*value, expect);
    }

    let second = &records[1];
    assert_eq!(second.annotations.species, vec!["deer", "elk"]);
    assert!(second.annotations.bbox.is_empty());

    let third = &records[2];
    assert_eq!(third.location.as_deref(), Some("17"));
    assert_eq!(third.annotations.species, vec!["empty"]);

    let bbox_only = &records[3];
    assert!(bbox_only.annotations.species.is_empty());
    assert_eq!(bbox_only.annotations.bbox.len(), 1);
    assert_eq!(bbox_only.annotations.bbox[0].category, "moose");
    assert!(bbox_only.annotations.bbox[0].bbox_rel.is_none());

    Ok(())
}

#[test]
fn write_sampled_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path(), Some(2));

    let records = pipeline::merge(&config)?;
    assert_eq!(records.len(), 4);

    let written = read_json(&config.output.file)?;
    assert_eq!(ids(&written), vec![FIRST_ID, SECOND_ID]);
    assert_eq!(written[0], records[0]);
    Ok(())
}

#[test]
fn upload_and_query_local_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path(), None);

    assert_eq!(pipeline::upload(&config, None)?, 4);

    let elk = pipeline::query(&config, &Query::WithSpecies("elk".into()))?;
    assert_eq!(ids(&elk), vec![FIRST_ID, SECOND_ID]);

    let boxed = pipeline::query(&config, &Query::WithBoundingBoxes)?;
    assert_eq!(ids(&boxed), vec![FIRST_ID, BBOX_ONLY_ID]);

    let moose = pipeline::query(&config, &Query::WithSpecies("moose".into()))?;
    assert!(moose.is_empty());

    // same ids in the same partition conflict
    assert!(pipeline::upload(&config, Some(1)).is_err());
    Ok(())
}
