use crate::frame::Frame;

/// Pixel-wise dissimilarity between two equally sized frames.
///
/// Mean absolute difference over the RGB channels, normalized to [0, 1]:
/// 0.0 for identical images, 1.0 for e.g. pure black vs pure white. The
/// alpha channel is ignored — snapshots are opaque JPEGs. Pure and
/// deterministic; both frames come from the same fixed source, so a
/// dimension mismatch is unexpected and fails the call.
pub fn diff(a: &Frame, b: &Frame) -> Result<f64, DiffError> {
    if a.dimensions() != b.dimensions() {
        return Err(DiffError::DimensionMismatch {
            a: a.dimensions(),
            b: b.dimensions(),
        });
    }

    let (width, height) = a.dimensions();
    if width == 0 || height == 0 {
        return Ok(0.0);
    }

    let mut total: u64 = 0;
    for (pa, pb) in a.image.pixels().zip(b.image.pixels()) {
        for channel in 0..3 {
            total += pa.0[channel].abs_diff(pb.0[channel]) as u64;
        }
    }

    let samples = width as u64 * height as u64 * 3;
    Ok(total as f64 / (samples as f64 * 255.0))
}

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("frame dimensions differ: {a:?} vs {b:?}")]
    DimensionMismatch { a: (u32, u32), b: (u32, u32) },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let image = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        Frame::new(image, Vec::new(), 0)
    }

    #[test]
    fn identical_frames_diff_zero() {
        let frame = solid(8, 8, [120, 45, 200]);
        assert_eq!(diff(&frame, &frame).unwrap(), 0.0);
    }

    #[test]
    fn diff_is_symmetric() {
        let a = solid(8, 8, [10, 20, 30]);
        let b = solid(8, 8, [200, 100, 50]);
        assert_eq!(diff(&a, &b).unwrap(), diff(&b, &a).unwrap());
    }

    #[test]
    fn black_vs_white_is_one() {
        let black = solid(4, 4, [0, 0, 0]);
        let white = solid(4, 4, [255, 255, 255]);
        let score = diff(&black, &white).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_channel_shift_is_proportional() {
        // Every RGB sample differs by exactly 51 = 255 * 0.2.
        let a = solid(4, 4, [100, 100, 100]);
        let b = solid(4, 4, [151, 151, 151]);
        let score = diff(&a, &b).unwrap();
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = solid(4, 4, [0, 0, 0]);
        let b = solid(8, 8, [0, 0, 0]);
        assert!(matches!(
            diff(&a, &b),
            Err(DiffError::DimensionMismatch { .. })
        ));
    }
}
