use crate::motion::Strategy;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the detection and field extraction pipelines
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("precondition violated: {0}")]
    Precondition(#[from] Precondition),

    #[error("no contour with area >= {min_area}")]
    NoCandidate { min_area: f64 },

    #[error("stored state is {stored:?} but frame is {found:?}")]
    StateCorruption { stored: (u32, u32), found: (u32, u32) },
}

impl Error {
    /// True when the call was rejected before any state was touched
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::Precondition(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum Precondition {
    #[error("alpha {0} must lie in [0, 1]")]
    Alpha(f32),

    #[error("frame is empty")]
    EmptyFrame,

    #[error("expected {expected:?}, found {found:?}")]
    SizeMismatch { expected: (u32, u32), found: (u32, u32) },

    #[error("boundary needs at least 3 vertices, got {0}")]
    DegenerateBoundary(usize),

    #[error("{0} needs a background frame")]
    MissingBackground(Strategy),
}

/// Reject `alpha` outside `[0, 1]` (NaN included)
pub(crate) fn check_alpha(alpha: f32) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(Precondition::Alpha(alpha).into())
    }
}

/// Reject zero-sized frames
pub(crate) fn check_frame(dimensions: (u32, u32)) -> Result<()> {
    if dimensions.0 == 0 || dimensions.1 == 0 {
        Err(Precondition::EmptyFrame.into())
    } else {
        Ok(())
    }
}

/// Reject a freshly supplied image whose size differs from the frame
pub(crate) fn check_same_size(expected: (u32, u32), found: (u32, u32)) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Precondition::SizeMismatch { expected, found }.into())
    }
}

/// Reject a frame whose size differs from state kept across calls
pub(crate) fn check_state(stored: (u32, u32), found: (u32, u32)) -> Result<()> {
    if stored == found {
        Ok(())
    } else {
        Err(Error::StateCorruption { stored, found })
    }
}
