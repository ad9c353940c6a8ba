use super::types::{Detection, Strategy};
use super::{
    AdaptiveBackgroundSubtraction, FrameDifferencing, GaussianRunningAverage,
    StaticBackgroundSubtraction,
};
use crate::error::{check_alpha, Precondition, Result};
use crate::geometry::GeometryFilter;
use image::RgbImage;

/// Per-call arguments a stream feeds to its strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSettings {
    /// Blend coefficient for the adaptive strategies
    pub alpha: f32,
    /// Reference refresh period for frame differencing
    pub time_window: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            time_window: 1,
        }
    }
}

enum Detector {
    FrameDifferencing(FrameDifferencing),
    StaticBackground(StaticBackgroundSubtraction, RgbImage),
    AdaptiveBackground(AdaptiveBackgroundSubtraction, RgbImage),
    RunningAverage(GaussianRunningAverage, RgbImage),
}

/// One video stream bound to one strategy instance
///
/// Owns the strategy's temporal state; run one stream per camera. A reset
/// request is carried into the next processed frame.
pub struct MotionStream {
    detector: Detector,
    settings: StreamSettings,
    reset_pending: bool,
    frames: u64,
}

impl MotionStream {
    /// Build a stream for `strategy`
    ///
    /// Every strategy except frame differencing needs a `background`.
    pub fn new(
        strategy: Strategy,
        filter: GeometryFilter,
        background: Option<RgbImage>,
        settings: StreamSettings,
    ) -> Result<Self> {
        if strategy.uses_alpha() {
            check_alpha(settings.alpha)?;
        }

        let detector = match (strategy, background) {
            (Strategy::FrameDifferencing, _) => {
                Detector::FrameDifferencing(FrameDifferencing::new(filter))
            }
            (Strategy::StaticBackground, Some(background)) => {
                Detector::StaticBackground(StaticBackgroundSubtraction::new(filter), background)
            }
            (Strategy::AdaptiveBackground, Some(background)) => Detector::AdaptiveBackground(
                AdaptiveBackgroundSubtraction::new(filter),
                background,
            ),
            (Strategy::RunningAverage, Some(background)) => {
                Detector::RunningAverage(GaussianRunningAverage::new(filter), background)
            }
            (strategy, None) => return Err(Precondition::MissingBackground(strategy).into()),
        };

        tracing::info!("Motion stream using {}", strategy);

        Ok(Self {
            detector,
            settings,
            reset_pending: false,
            frames: 0,
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self.detector {
            Detector::FrameDifferencing(_) => Strategy::FrameDifferencing,
            Detector::StaticBackground(..) => Strategy::StaticBackground,
            Detector::AdaptiveBackground(..) => Strategy::AdaptiveBackground,
            Detector::RunningAverage(..) => Strategy::RunningAverage,
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Frames processed successfully so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Reinitialise the strategy state on the next frame
    pub fn reset(&mut self) {
        tracing::info!("Reset requested for {} stream", self.strategy());
        self.reset_pending = true;
    }

    /// Run the strategy on the next frame of the stream
    pub fn process(&mut self, frame: &RgbImage) -> Result<Detection> {
        let reset = self.reset_pending;
        let StreamSettings { alpha, time_window } = self.settings;

        let detection = match &mut self.detector {
            Detector::FrameDifferencing(detector) => detector.detect(frame, time_window, reset)?,
            Detector::StaticBackground(detector, background) => detector.detect(frame, background)?,
            Detector::AdaptiveBackground(detector, background) => {
                detector.detect(frame, background, alpha, reset)?
            }
            Detector::RunningAverage(detector, background) => {
                detector.detect(frame, background, alpha, reset)?
            }
        };

        self.reset_pending = false;
        self.frames += 1;

        Ok(detection)
    }
}
