//! PNG output of a [`Frame`].
//!
//! Feature-gated behind `png` (default on) so the raster itself can be used
//! without pulling in the `image` crate.

use std::path::Path;

use fieldlines_core::error::FieldError;

use crate::pixel::Frame;

/// Writes a frame as a PNG image.
///
/// Returns `FieldError::InvalidDimensions` if the frame dimensions overflow
/// `u32`, or `FieldError::Io` on write failure.
pub fn write_png(frame: &Frame, path: &Path) -> Result<(), FieldError> {
    let invalid = || FieldError::InvalidDimensions {
        width: frame.width() as f64,
        height: frame.height() as f64,
    };
    let w = u32::try_from(frame.width()).map_err(|_| invalid())?;
    let h = u32::try_from(frame.height()).map_err(|_| invalid())?;
    let img = image::RgbaImage::from_raw(w, h, frame.data().to_vec())
        .ok_or_else(|| FieldError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| FieldError::Io(format!("{}: {e}", path.display())))
}
