use super::detect::detect_changes;
use super::types::{Detection, DetectionParams};
use crate::error::{check_alpha, check_frame, check_same_size, check_state, Result};
use crate::geometry::GeometryFilter;
use crate::preprocess::Preprocessor;
use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array2, Zip};

/// Detects motion against an exponential running average of the stream
///
/// The background is kept as a floating-point accumulator over blurred
/// grayscale frames so that rounding error does not build up over long
/// sequences. Unlike [`AdaptiveBackgroundSubtraction`], the accumulator is
/// updated with the current frame before differencing.
///
/// [`AdaptiveBackgroundSubtraction`]: super::AdaptiveBackgroundSubtraction
pub struct GaussianRunningAverage {
    preprocessor: Preprocessor,
    params: DetectionParams,
    filter: GeometryFilter,
    accumulator: Option<Array2<f64>>,
}

impl GaussianRunningAverage {
    pub fn new(filter: GeometryFilter) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            params: DetectionParams::running_average(),
            filter,
            accumulator: None,
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Accumulator indexed `[row, column]`
    pub fn accumulator(&self) -> Option<&Array2<f64>> {
        self.accumulator.as_ref()
    }

    /// Accumulator rounded and saturated to 8 bits
    pub fn background(&self) -> Option<GrayImage> {
        self.accumulator.as_ref().map(quantize)
    }

    pub fn reset(&mut self) {
        tracing::debug!("Resetting running average");
        self.accumulator = None;
    }

    /// Fold `frame` into the running average, then detect motion against it
    ///
    /// `background` seeds the accumulator on the first call and whenever
    /// `reset` is set; it is ignored otherwise.
    pub fn detect(
        &mut self,
        frame: &RgbImage,
        background: &RgbImage,
        alpha: f32,
        reset: bool,
    ) -> Result<Detection> {
        let _span = tracing::debug_span!("running_average").entered();

        check_alpha(alpha)?;
        check_frame(frame.dimensions())?;

        let reseed = reset || self.accumulator.is_none();

        if reseed {
            check_same_size(frame.dimensions(), background.dimensions())?;
        } else if let Some(accumulator) = &self.accumulator {
            check_state(dimensions(accumulator), frame.dimensions())?;
        }

        let current = self.preprocessor.preprocess(frame)?;

        let mut accumulator = match self.accumulator.take() {
            Some(accumulator) if !reseed => accumulator,
            _ => {
                tracing::debug!("Seeding running average");
                to_array(&self.preprocessor.preprocess(background)?)
            }
        };

        let alpha = alpha as f64;
        Zip::from(&mut accumulator)
            .and(&to_array(&current))
            .for_each(|acc, &value| *acc = alpha * value + (1.0 - alpha) * *acc);

        let reference = quantize(&accumulator);
        let detection = detect_changes(frame, &reference, &current, &self.params, &self.filter);

        self.accumulator = Some(accumulator);

        Ok(detection)
    }
}

/// `(width, height)` of an accumulator
fn dimensions(accumulator: &Array2<f64>) -> (u32, u32) {
    let (rows, cols) = accumulator.dim();
    (cols as u32, rows as u32)
}

fn to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        image.get_pixel(x as u32, y as u32)[0] as f64
    })
}

fn quantize(accumulator: &Array2<f64>) -> GrayImage {
    let (width, height) = dimensions(accumulator);
    GrayImage::from_fn(width, height, |x, y| {
        let value = accumulator[[y as usize, x as usize]];
        Luma([value.abs().round().min(255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldBoundary;
    use image::Rgb;
    use imageproc::point::Point;

    fn averager() -> GaussianRunningAverage {
        let boundary = FieldBoundary::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(200.0, 0.0),
                Point::new(200.0, 150.0),
                Point::new(0.0, 150.0),
            ],
            100.0,
        )
        .unwrap();
        GaussianRunningAverage::new(GeometryFilter::new(boundary))
    }

    fn flat(value: u8) -> RgbImage {
        RgbImage::from_pixel(200, 150, Rgb([value, value, value]))
    }

    #[test]
    fn test_accumulator_shape() {
        let mut avg = averager();
        avg.detect(&flat(10), &flat(10), 0.1, false).unwrap();

        let acc = avg.accumulator().unwrap();
        assert_eq!(acc.dim(), (150, 200));
        assert_eq!(avg.background().unwrap().dimensions(), (200, 150));
    }

    #[test]
    fn test_update_precedes_differencing() {
        let mut avg = averager();

        // With alpha = 1 the background becomes the frame before comparison
        let detection = avg.detect(&flat(220), &flat(0), 1.0, false).unwrap();
        assert!(detection.boxes.is_empty());

        let mut avg = averager();
        let detection = avg.detect(&flat(220), &flat(0), 0.0, false).unwrap();
        assert_eq!(detection.boxes.len(), 1);
    }

    #[test]
    fn test_accumulator_keeps_fractions() {
        let mut avg = averager();
        avg.detect(&flat(0), &flat(0), 0.1, false).unwrap();
        avg.detect(&flat(5), &flat(0), 0.1, false).unwrap();
        avg.detect(&flat(5), &flat(0), 0.1, false).unwrap();

        // Sub-unit values an 8-bit background would have rounded away
        let centre = avg.accumulator().unwrap()[[75, 100]];
        assert!(centre > 0.3 && centre < 1.0);
        assert_eq!(avg.background().unwrap().get_pixel(100, 75)[0], centre.round() as u8);
    }

    #[test]
    fn test_state_persists_across_calls() {
        let mut avg = averager();
        for _ in 0..30 {
            avg.detect(&flat(200), &flat(0), 0.2, false).unwrap();
        }

        let centre = avg.accumulator().unwrap()[[75, 100]];
        assert!(centre > 195.0);
    }

    #[test]
    fn test_invalid_alpha_leaves_state() {
        let mut avg = averager();
        avg.detect(&flat(50), &flat(50), 0.5, false).unwrap();
        let before = avg.accumulator().cloned();

        for alpha in [-0.01, 1.01] {
            assert!(avg.detect(&flat(0), &flat(0), alpha, true).unwrap_err().is_precondition());
        }
        assert_eq!(avg.accumulator().cloned(), before);
    }

    #[test]
    fn test_size_change_is_state_corruption() {
        let mut avg = averager();
        avg.detect(&flat(50), &flat(50), 0.5, false).unwrap();

        let other = RgbImage::new(100, 100);
        let err = avg.detect(&other, &other, 0.5, false).unwrap_err();
        assert!(!err.is_precondition());
        assert_eq!(avg.accumulator().unwrap().dim(), (150, 200));

        avg.reset();
        assert!(avg.detect(&other, &other, 0.5, false).is_ok());
    }
}
