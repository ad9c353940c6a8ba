use super::OutputSink;
use anyhow::{Context, Result};
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};

/// Writes every frame as `<label>.png` into a directory
pub struct ImageDirSink {
    dir: PathBuf,
    written: usize,
}

impl ImageDirSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        tracing::info!("Writing frames to {}", dir.display());

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{}.png", label))
    }

    /// Number of images written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl OutputSink for ImageDirSink {
    fn write_frame(&mut self, label: &str, frame: &RgbImage) -> Result<()> {
        let path = self.path_for(label);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn write_mask(&mut self, label: &str, mask: &GrayImage) -> Result<()> {
        let path = self.path_for(label);
        mask.save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.written += 1;
        Ok(())
    }
}
