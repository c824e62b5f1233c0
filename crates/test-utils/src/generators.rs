//! Band data generators for synthetic rasters.
//!
//! These generators create predictable, verifiable pixel patterns that
//! can be used across the test suite. All outputs are row-major, row 0
//! being the northernmost row.

/// Creates a band where each value encodes its position.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::position_band;
///
/// let band = position_band(10, 5);
/// assert_eq!(band.len(), 50);
/// assert_eq!(band[1], 1000.0); // col=1, row=0
/// assert_eq!(band[10], 1.0);   // col=0, row=1
/// ```
pub fn position_band(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// A left-to-right ramp of 8-bit values spanning `0..=255`.
pub fn ramp_u8(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            let v = if width > 1 {
                col * 255 / (width - 1)
            } else {
                0
            };
            data.push(v as u8);
        }
    }
    data
}

/// A top-to-bottom ramp of 16-bit values between `min` and `max`.
pub fn ramp_u16(width: usize, height: usize, min: u16, max: u16) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    let span = max.saturating_sub(min) as usize;
    for row in 0..height {
        let v = if height > 1 {
            min as usize + row * span / (height - 1)
        } else {
            min as usize
        };
        data.extend(std::iter::repeat(v as u16).take(width));
    }
    data
}

/// Constant-valued band.
pub fn constant_band<T: Copy>(width: usize, height: usize, value: T) -> Vec<T> {
    vec![value; width * height]
}

/// A band with zeros in the left `zero_cols` columns and `value` elsewhere.
///
/// Useful for exercising zero-mask alpha.
pub fn band_with_zero_border<T: Copy + Default>(
    width: usize,
    height: usize,
    zero_cols: usize,
    value: T,
) -> Vec<T> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(if col < zero_cols { T::default() } else { value });
        }
    }
    data
}

/// Reflectance-like floating point band in `[0.0, 1.0)` with a smooth
/// diagonal gradient.
pub fn reflectance_band(width: usize, height: usize, phase: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let t = (col + row) as f32 / (width + height).max(1) as f32;
            data.push(((t + phase) % 1.0).abs());
        }
    }
    data
}

/// Three 8-bit bands (R, G, B) with distinct ramps.
pub fn rgb_bands(width: usize, height: usize) -> Vec<Vec<u8>> {
    let red = ramp_u8(width, height);
    let green: Vec<u8> = red.iter().map(|v| 255 - v).collect();
    let blue = constant_band(width, height, 128u8);
    vec![red, green, blue]
}
