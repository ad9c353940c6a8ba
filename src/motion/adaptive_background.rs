use super::detect::detect_changes;
use super::types::{Detection, DetectionParams};
use crate::error::{check_alpha, check_frame, check_same_size, check_state, Result};
use crate::geometry::GeometryFilter;
use crate::preprocess::Preprocessor;
use image::{Rgb, RgbImage};

/// Detects motion against a colour background that drifts towards the stream
///
/// Detection runs on the blurred grayscale images. The stored background is
/// then blended with the raw colour frame:
/// `background = alpha * frame + (1 - alpha) * background`.
pub struct AdaptiveBackgroundSubtraction {
    preprocessor: Preprocessor,
    params: DetectionParams,
    filter: GeometryFilter,
    background: Option<RgbImage>,
}

impl AdaptiveBackgroundSubtraction {
    pub fn new(filter: GeometryFilter) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            params: DetectionParams::adaptive_background(),
            filter,
            background: None,
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Background as it stands after the last call
    pub fn background(&self) -> Option<&RgbImage> {
        self.background.as_ref()
    }

    pub fn reset(&mut self) {
        tracing::debug!("Resetting adaptive background");
        self.background = None;
    }

    /// Detect motion in `frame`, then adapt the background towards it
    ///
    /// `background` seeds the model on the first call and whenever `reset`
    /// is set; it is ignored otherwise.
    pub fn detect(
        &mut self,
        frame: &RgbImage,
        background: &RgbImage,
        alpha: f32,
        reset: bool,
    ) -> Result<Detection> {
        let _span = tracing::debug_span!("adaptive_background").entered();

        check_alpha(alpha)?;
        check_frame(frame.dimensions())?;

        let model = match self.background.as_ref() {
            Some(stored) if !reset => {
                check_state(stored.dimensions(), frame.dimensions())?;
                stored
            }
            _ => {
                check_same_size(frame.dimensions(), background.dimensions())?;
                tracing::debug!("Seeding adaptive background");
                background
            }
        };

        let reference = self.preprocessor.preprocess(model)?;
        let current = self.preprocessor.preprocess(frame)?;

        let detection = detect_changes(frame, &reference, &current, &self.params, &self.filter);

        let blended = blend(frame, model, alpha);
        self.background = Some(blended);

        Ok(detection)
    }
}

/// `alpha * frame + (1 - alpha) * background`, per channel, rounded and saturated
pub fn blend(frame: &RgbImage, background: &RgbImage, alpha: f32) -> RgbImage {
    let (width, height) = frame.dimensions();

    RgbImage::from_fn(width, height, |x, y| {
        let f = frame.get_pixel(x, y);
        let b = background.get_pixel(x, y);

        let mix = |c: usize| {
            (alpha * f[c] as f32 + (1.0 - alpha) * b[c] as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        };

        Rgb([mix(0), mix(1), mix(2)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldBoundary;
    use imageproc::point::Point;

    fn subtractor() -> AdaptiveBackgroundSubtraction {
        let boundary = FieldBoundary::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(200.0, 0.0),
                Point::new(200.0, 200.0),
                Point::new(0.0, 200.0),
            ],
            100.0,
        )
        .unwrap();
        AdaptiveBackgroundSubtraction::new(GeometryFilter::new(boundary))
    }

    fn flat(r: u8, g: u8, b: u8) -> RgbImage {
        RgbImage::from_pixel(200, 200, Rgb([r, g, b]))
    }

    #[test]
    fn test_blend_rounds_per_channel() {
        let out = blend(&flat(100, 0, 255), &flat(0, 100, 0), 0.25);
        assert_eq!(out.get_pixel(0, 0), &Rgb([25, 75, 64]));
    }

    #[test]
    fn test_alpha_extremes() {
        let mut sub = subtractor();
        let background = flat(10, 10, 10);
        let frame = flat(200, 100, 50);

        sub.detect(&frame, &background, 0.0, false).unwrap();
        assert_eq!(sub.background(), Some(&background));

        sub.detect(&frame, &background, 1.0, false).unwrap();
        assert_eq!(sub.background(), Some(&frame));
    }

    #[test]
    fn test_invalid_alpha_leaves_state() {
        let mut sub = subtractor();
        let background = flat(10, 10, 10);
        sub.detect(&flat(20, 20, 20), &background, 0.5, false).unwrap();
        let before = sub.background().cloned();

        for alpha in [-0.01, 1.01] {
            let err = sub.detect(&flat(90, 90, 90), &background, alpha, true).unwrap_err();
            assert!(err.is_precondition());
        }
        assert_eq!(sub.background().cloned(), before);
    }

    #[test]
    fn test_background_converges_to_scene() {
        let mut sub = subtractor();
        let background = flat(0, 0, 0);
        let scene = flat(200, 200, 200);

        let first = sub.detect(&scene, &background, 0.5, false).unwrap();
        assert_eq!(first.boxes.len(), 1);

        for _ in 0..10 {
            sub.detect(&scene, &background, 0.5, false).unwrap();
        }

        // The scene has been absorbed into the background
        let last = sub.detect(&scene, &background, 0.5, false).unwrap();
        assert!(last.boxes.is_empty());
    }

    #[test]
    fn test_reset_reseeds_background() {
        let mut sub = subtractor();
        sub.detect(&flat(50, 50, 50), &flat(0, 0, 0), 0.5, false).unwrap();

        let seed = flat(120, 120, 120);
        sub.detect(&seed, &seed, 0.3, true).unwrap();
        assert_eq!(sub.background(), Some(&seed));

        sub.reset();
        assert!(sub.background().is_none());
    }

    #[test]
    fn test_size_change_is_state_corruption() {
        let mut sub = subtractor();
        sub.detect(&flat(50, 50, 50), &flat(0, 0, 0), 0.5, false).unwrap();

        let small = RgbImage::new(50, 50);
        let err = sub.detect(&small, &small, 0.5, false).unwrap_err();
        assert!(!err.is_precondition());
        assert_eq!(sub.background().map(|b| b.dimensions()), Some((200, 200)));
    }
}
