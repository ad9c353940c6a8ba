//! Playing-field segmentation by boundary line colour

mod extract;
pub mod hsv;

pub use extract::{FieldExtraction, FieldExtractor, Side};
