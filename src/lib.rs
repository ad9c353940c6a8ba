//! Motion detection and playing-field segmentation for volleyball footage
//!
//! Frames are [`image::RgbImage`]s. A [`motion::MotionStream`] (or one of the
//! strategy types it wraps) turns consecutive frames into boxes around moving
//! regions on the field, and a [`field::FieldExtractor`] recovers the field
//! itself from the colour of its boundary line.

pub mod capture;
pub mod error;
pub mod field;
pub mod geometry;
pub mod motion;
pub mod output;
pub mod preprocess;
pub mod transform;

pub use error::{Error, Precondition, Result};
pub use field::{FieldExtraction, FieldExtractor, Side};
pub use geometry::{BoundingBox, FieldBoundary, GeometryFilter};
pub use motion::{
    AdaptiveBackgroundSubtraction, Detection, FrameDifferencing, GaussianRunningAverage,
    MotionStream, StaticBackgroundSubtraction, Strategy, StreamSettings,
};
