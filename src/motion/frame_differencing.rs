use super::detect::detect_changes;
use super::types::{Detection, DetectionParams};
use crate::error::{check_state, Result};
use crate::geometry::GeometryFilter;
use crate::preprocess::Preprocessor;
use image::{GrayImage, RgbImage};

/// Reference frame and how many frames have been compared against it
struct Reference {
    frame: RgbImage,
    gray: GrayImage,
    elapsed: u32,
}

impl Reference {
    fn new(frame: &RgbImage, gray: GrayImage) -> Self {
        Self {
            frame: frame.clone(),
            gray,
            elapsed: 0,
        }
    }
}

/// Detects motion against a periodically refreshed reference frame
///
/// The reference is taken from the stream itself: the first frame (or the
/// frame passed with `reset`) becomes the reference, and it is replaced by the
/// current frame every `time_window` calls. A `time_window` of 0 never
/// refreshes it.
pub struct FrameDifferencing {
    preprocessor: Preprocessor,
    params: DetectionParams,
    filter: GeometryFilter,
    reference: Option<Reference>,
}

impl FrameDifferencing {
    pub fn new(filter: GeometryFilter) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            params: DetectionParams::frame_differencing(),
            filter,
            reference: None,
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Current reference frame, `None` before the first call or after a reset
    pub fn reference_frame(&self) -> Option<&RgbImage> {
        self.reference.as_ref().map(|r| &r.frame)
    }

    /// Calls made since the reference was last replaced
    pub fn elapsed_count(&self) -> u32 {
        self.reference.as_ref().map_or(0, |r| r.elapsed)
    }

    /// Drop the reference; the next frame becomes the new one
    pub fn reset(&mut self) {
        tracing::debug!("Resetting frame differencing reference");
        self.reference = None;
    }

    /// Compare `frame` against the reference and advance the window
    pub fn detect(&mut self, frame: &RgbImage, time_window: u32, reset: bool) -> Result<Detection> {
        let _span = tracing::debug_span!("frame_differencing").entered();

        let current = self.preprocessor.preprocess(frame)?;

        if let Some(reference) = self.reference.as_ref().filter(|_| !reset) {
            check_state(reference.frame.dimensions(), frame.dimensions())?;
        }

        let mut reference = match self.reference.take() {
            Some(reference) if !reset => reference,
            _ => {
                tracing::debug!("Initialising reference frame");
                Reference::new(frame, current.clone())
            }
        };

        let detection = detect_changes(frame, &reference.gray, &current, &self.params, &self.filter);

        reference.elapsed = reference.elapsed.saturating_add(1);

        if reference.elapsed == time_window {
            tracing::debug!("Refreshing reference frame after {} frames", time_window);
            reference = Reference::new(frame, current);
        }

        self.reference = Some(reference);

        Ok(detection)
    }
}
