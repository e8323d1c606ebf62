//! Reshapes COCO Camera Traps databases into per-image documents and loads
//! them into a document store.

mod common;
pub mod config;
pub mod dataset;
pub mod pipeline;
pub mod store;
