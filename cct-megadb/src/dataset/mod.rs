//! Dataset loading and merging toolkit.

mod bounding_box;
mod cct;
mod dataset_;
mod image_metadata;
mod indexed;
mod merge;
mod normalize;
mod record;

pub use bounding_box::*;
pub use cct::*;
pub use dataset_::*;
pub use image_metadata::*;
pub use indexed::*;
pub use merge::*;
pub use normalize::*;
pub use record::*;
