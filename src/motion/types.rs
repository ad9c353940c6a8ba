use crate::geometry::BoundingBox;
use image::RgbImage;

/// Result of running a motion strategy on one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Copy of the input frame with every box drawn on it
    pub annotated: RgbImage,
    /// Boxes around the moving regions that survived the field filter
    pub boxes: Vec<BoundingBox>,
}

/// Thresholds shared by the differencing path of every strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Differences strictly above this value count as motion
    pub threshold: u8,
    /// Contours enclosing less than this area are dropped
    pub min_area: f64,
    /// Number of 3x3 dilation passes applied to the binary mask
    pub dilate_iterations: u8,
}

impl DetectionParams {
    pub fn frame_differencing() -> Self {
        Self {
            threshold: 25,
            min_area: 6500.0,
            dilate_iterations: 2,
        }
    }

    /// A static background is cleaner, so a lower threshold is used
    pub fn static_background() -> Self {
        Self {
            threshold: 13,
            min_area: 4000.0,
            dilate_iterations: 2,
        }
    }

    pub fn adaptive_background() -> Self {
        Self {
            threshold: 25,
            min_area: 4000.0,
            dilate_iterations: 2,
        }
    }

    pub fn running_average() -> Self {
        Self::adaptive_background()
    }
}

/// The available background-modelling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Reference frame refreshed every `time_window` frames
    FrameDifferencing,
    /// Fixed background supplied with every frame
    StaticBackground,
    /// Colour background blended towards each new frame after detection
    AdaptiveBackground,
    /// Floating-point grayscale background updated before detection
    RunningAverage,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::FrameDifferencing,
        Strategy::StaticBackground,
        Strategy::AdaptiveBackground,
        Strategy::RunningAverage,
    ];

    /// Whether the strategy consumes an explicit background frame
    pub fn needs_background(&self) -> bool {
        !matches!(self, Strategy::FrameDifferencing)
    }

    /// Whether the strategy consumes a blend coefficient
    pub fn uses_alpha(&self) -> bool {
        matches!(self, Strategy::AdaptiveBackground | Strategy::RunningAverage)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FrameDifferencing => "frame-differencing",
            Strategy::StaticBackground => "static-background",
            Strategy::AdaptiveBackground => "adaptive-background",
            Strategy::RunningAverage => "running-average",
        }
    }

    pub fn default_params(&self) -> DetectionParams {
        match self {
            Strategy::FrameDifferencing => DetectionParams::frame_differencing(),
            Strategy::StaticBackground => DetectionParams::static_background(),
            Strategy::AdaptiveBackground => DetectionParams::adaptive_background(),
            Strategy::RunningAverage => DetectionParams::running_average(),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
