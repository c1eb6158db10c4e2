use crate::common::*;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build a size that is safe to divide by.
    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "image width and height must be positive, but get {}x{}",
            width,
            height
        );
        Ok(Self { width, height })
    }

    pub fn try_from_usize(width: usize, height: usize) -> Result<Self> {
        let cast = |value: usize| -> Result<u32> {
            let value = u32::try_from(value)?;
            Ok(value)
        };
        Self::try_new(cast(width)?, cast(height)?)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
