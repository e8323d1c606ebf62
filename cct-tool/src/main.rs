use anyhow::{Context, Result};
use cct_megadb::{
    config::Config,
    dataset::{ImageRecord, IndexOptions, IndexedDb},
    pipeline,
    store::Query,
};
use clap::Parser;
use itertools::Itertools;
use prettytable::{cell, row, Table};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
/// Migrate COCO Camera Traps databases into a document store
enum Opts {
    /// Merge the databases and write the output file
    Merge {
        #[clap(long, default_value = "cct.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Merge the databases and insert the records into the store
    Upload {
        #[clap(long, default_value = "cct.json5")]
        /// configuration file
        config_file: PathBuf,
        #[clap(long)]
        /// insert only the first N records
        limit: Option<usize>,
    },
    /// Query records in the store
    Query {
        #[clap(long, default_value = "cct.json5")]
        /// configuration file
        config_file: PathBuf,
        #[clap(long, conflicts_with = "species", required_unless_present = "species")]
        /// records with at least one bounding box
        with_bbox: bool,
        #[clap(long)]
        /// records labeled with this species
        species: Option<String>,
    },
    /// Show the summary of a database file
    Info {
        /// COCO Camera Traps file
        db_file: PathBuf,
    },
}

fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Opts::parse() {
        Opts::Merge { config_file } => {
            let config = open_config(config_file)?;
            pipeline::merge(&config)?;
        }
        Opts::Upload { config_file, limit } => {
            let config = open_config(config_file)?;
            let count = pipeline::upload(&config, limit)?;
            info!("uploaded {} records", count);
        }
        Opts::Query {
            config_file,
            species,
            ..
        } => {
            let config = open_config(config_file)?;
            let query = match species {
                Some(species) => Query::WithSpecies(species),
                None => Query::WithBoundingBoxes,
            };
            let records = pipeline::query(&config, &query)?;
            print_records(&records);
        }
        Opts::Info { db_file } => {
            info(db_file)?;
        }
    }

    Ok(())
}

fn open_config(config_file: PathBuf) -> Result<Config> {
    Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))
}

fn print_records(records: &[ImageRecord]) {
    let mut table = Table::new();
    table.add_row(row!["id", "location", "datetime", "species", "boxes"]);

    records.iter().for_each(|record| {
        table.add_row(row![
            record.id,
            record.location.as_deref().unwrap_or(""),
            record.datetime.as_deref().unwrap_or(""),
            record.annotations.species.join(","),
            record.annotations.bbox.len(),
        ]);
    });

    table.printstd();
}

fn info(db_file: PathBuf) -> Result<()> {
    let db = IndexedDb::open(&db_file, &IndexOptions::default())?;

    // per-category counts
    {
        let counts = db
            .db
            .annotations
            .iter()
            .map(|ann| ann.category_id)
            .counts();

        let mut table = Table::new();
        table.add_row(row!["category id", "name", "annotations"]);
        db.db
            .categories
            .iter()
            .sorted_by_key(|cat| cat.id)
            .for_each(|cat| {
                table.add_row(row![
                    cat.id,
                    cat.name,
                    counts.get(&cat.id).copied().unwrap_or(0)
                ]);
            });
        table.printstd();
    }

    let num_boxes = db
        .db
        .annotations
        .iter()
        .filter(|ann| ann.bbox.is_some())
        .count();
    let num_unlabeled = db
        .images()
        .filter(|image| db.annotations_for_image(&image.id).is_empty())
        .count();

    println!("images: {}", db.num_images());
    println!("unlabeled images: {}", num_unlabeled);
    println!("annotations: {}", db.db.annotations.len());
    println!("bounding boxes: {}", num_boxes);

    Ok(())
}
