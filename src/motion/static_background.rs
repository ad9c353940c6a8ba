use super::detect::detect_changes;
use super::types::{Detection, DetectionParams};
use crate::error::{check_frame, check_same_size, Result};
use crate::geometry::GeometryFilter;
use crate::preprocess::Preprocessor;
use image::RgbImage;

/// Detects motion against a background supplied with every frame
///
/// Carries no state between calls.
pub struct StaticBackgroundSubtraction {
    preprocessor: Preprocessor,
    params: DetectionParams,
    filter: GeometryFilter,
}

impl StaticBackgroundSubtraction {
    pub fn new(filter: GeometryFilter) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            params: DetectionParams::static_background(),
            filter,
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    pub fn detect(&self, frame: &RgbImage, background: &RgbImage) -> Result<Detection> {
        let _span = tracing::debug_span!("static_background").entered();

        check_frame(frame.dimensions())?;
        check_same_size(frame.dimensions(), background.dimensions())?;

        let reference = self.preprocessor.preprocess(background)?;
        let current = self.preprocessor.preprocess(frame)?;

        Ok(detect_changes(frame, &reference, &current, &self.params, &self.filter))
    }
}
