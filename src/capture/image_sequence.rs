use super::FrameSource;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames stored as numbered image files in a directory
///
/// Files are ordered by name, so zero-padded numbering keeps them in
/// capture order.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    resolution: Option<(u32, u32)>,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        tracing::info!("Opening frame sequence in {}", dir.display());

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);

            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();

        let resolution = match paths.first() {
            Some(first) => Some(
                image::image_dimensions(first)
                    .with_context(|| format!("Failed to read {}", first.display()))?,
            ),
            None => None,
        };

        tracing::info!("Found {} frames", paths.len());

        Ok(Self { paths, resolution })
    }

    /// Iterate over every frame in order
    pub fn iter(&self) -> impl Iterator<Item = Result<RgbImage>> + '_ {
        (0..self.paths.len()).map(move |i| self.get_frame(i))
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }
}

impl FrameSource for ImageSequence {
    fn get_frame(&self, index: usize) -> Result<RgbImage> {
        let Some(path) = self.paths.get(index) else {
            bail!("Frame {} out of range ({} frames)", index, self.paths.len());
        };

        let frame = image::open(path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();

        Ok(frame)
    }

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }
}

/// Load a single frame, such as a background plate
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    Ok(image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("courtside-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_frames_sorted_by_name() {
        let dir = scratch_dir("sequence");
        for (name, value) in [("002.png", 20u8), ("000.png", 0), ("001.png", 10)] {
            RgbImage::from_pixel(8, 6, Rgb([value, value, value]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let seq = ImageSequence::open(&dir).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.resolution(), Some((8, 6)));

        let values: Vec<u8> = seq.iter().map(|f| f.unwrap().get_pixel(0, 0)[0]).collect();
        assert_eq!(values, vec![0, 10, 20]);

        assert!(seq.get_frame(3).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        assert!(ImageSequence::open("/nonexistent/courtside/frames").is_err());
    }
}
