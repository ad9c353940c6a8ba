//! 8-bit HSV conversion: hue in `0..180` (degrees halved), saturation and
//! value in `0..=255`

use image::Rgb;

pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(|c| c as f32);

    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v == 0.0 { 0.0 } else { diff * 255.0 / v };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(179.0) as u8,
        s.round() as u8,
        v as u8,
    ]
}

/// Inclusive per-channel HSV bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    /// Hue band of `±tolerance` around `color`, with saturation and value
    /// floors; bounds saturate at 0 and 255
    pub fn around(color: Rgb<u8>, tolerance: u8, saturation_floor: u8, value_floor: u8) -> Self {
        let [hue, _, _] = rgb_to_hsv(color);

        Self {
            lower: [hue.saturating_sub(tolerance), saturation_floor, value_floor],
            upper: [hue.saturating_add(tolerance), 255, 255],
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| (self.lower[c]..=self.upper[c]).contains(&hsv[c]))
    }
}
