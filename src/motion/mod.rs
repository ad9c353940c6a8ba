mod adaptive_background;
mod detect;
mod frame_differencing;
mod running_average;
mod static_background;
mod stream;
pub mod types;

pub use adaptive_background::{blend, AdaptiveBackgroundSubtraction};
pub use detect::draw_boxes;
pub use frame_differencing::FrameDifferencing;
pub use running_average::GaussianRunningAverage;
pub use static_background::StaticBackgroundSubtraction;
pub use stream::{MotionStream, StreamSettings};
pub use types::{Detection, DetectionParams, Strategy};
