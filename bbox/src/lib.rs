//! Safe bounding box types and functions.

mod common;

pub use hw::*;
pub mod hw;

pub use rect::*;
pub mod rect;

pub use round::*;
pub mod round;

pub use xywh::*;
pub mod xywh;

pub mod prelude {
    pub use crate::{
        rect::{Rect, RectFloat, RectNum},
        round::RoundTo,
    };
}
