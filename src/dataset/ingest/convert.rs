//! Pixel and depth format conversion.
//!
//! Sources arrive as byte, half, or float RGBA; the dataset stores half
//! texels on the device. Conversion runs through an f32 working buffer
//! where transparency masking and sharpening are applied.

use glam::{UVec2, Vec3};

use crate::dataset::ingest::types::{DepthData, IngestOptions, PixelData};

/// RGBA channel count of every pixel payload.
pub(crate) const CHANNELS: usize = 4;

/// Converts an f32 to IEEE 754 half-precision bits, rounding to nearest
/// and saturating out-of-range values to infinity.
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let abs = bits & 0x7fff_ffff;

    if abs >= 0x7f80_0000 {
        // Infinity or NaN.
        return sign | 0x7c00 | if abs > 0x7f80_0000 { 0x0200 } else { 0 };
    }

    let exp = (abs >> 23) as i32 - 127;
    if exp > 15 {
        return sign | 0x7c00;
    }
    let mant = abs & 0x007f_ffff;
    if exp >= -14 {
        let half = (((exp + 15) as u32) << 10) | (mant >> 13);
        let round = (mant >> 12) & 1;
        return sign | (half + round) as u16;
    }
    if exp >= -24 {
        // Subnormal range.
        let mant = mant | 0x0080_0000;
        let shift = (-14 - exp) as u32 + 13;
        let half = mant >> shift;
        let round = (mant >> (shift - 1)) & 1;
        return sign | (half + round) as u16;
    }
    sign
}

/// Converts IEEE 754 half-precision bits to f32.
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0f32 } else { 1.0 };
    let exp = ((bits >> 10) & 0x1f) as i32;
    let mant = (bits & 0x3ff) as f32;
    match exp {
        0 => sign * mant * (2.0f32).powi(-24),
        31 => {
            if bits & 0x3ff == 0 {
                sign * f32::INFINITY
            } else {
                f32::NAN
            }
        }
        _ => sign * (1.0 + mant / 1024.0) * (2.0f32).powi(exp - 15),
    }
}

fn to_f32_rgba(pixels: &PixelData) -> Vec<f32> {
    match pixels {
        PixelData::Byte(data) => data.iter().map(|&v| v as f32 / 255.0).collect(),
        PixelData::Half(data) => data.iter().map(|&v| f16_to_f32(v)).collect(),
        PixelData::Float(data) => data.clone(),
    }
}

fn apply_transparency(rgba: &mut [f32], options: &IngestOptions) {
    let key = options.mask_color.map(|c| {
        Vec3::new(
            ((c >> 16) & 0xff) as f32 / 255.0,
            ((c >> 8) & 0xff) as f32 / 255.0,
            (c & 0xff) as f32 / 255.0,
        )
    });
    if !options.white_transparent && !options.black_transparent && key.is_none() {
        return;
    }

    // Byte sources land exactly on multiples of 1/255, so half an
    // encoding step separates distinct key colors.
    let tolerance = 0.5 / 255.0;
    for texel in rgba.chunks_exact_mut(CHANNELS) {
        let rgb = Vec3::new(texel[0], texel[1], texel[2]);
        let matched = (options.white_transparent && rgb == Vec3::ONE)
            || (options.black_transparent && rgb == Vec3::ZERO)
            || key.is_some_and(|k| (rgb - k).abs().max_element() < tolerance);
        if matched {
            texel[3] = 0.0;
        }
    }
}

/// 3x3 unsharp filter over the color channels, replicated borders.
/// Uniform images are fixed points.
fn sharpen(rgba: &mut [f32], resolution: UVec2, amount: f32) {
    let (w, h) = (resolution.x as usize, resolution.y as usize);
    if w == 0 || h == 0 {
        return;
    }
    let src = rgba.to_vec();
    let at = |x: usize, y: usize, c: usize| src[(y * w + x) * CHANNELS + c];

    for y in 0..h {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(h - 1);
        for x in 0..w {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(w - 1);
            for c in 0..3 {
                let center = at(x, y, c);
                let v = center * (1.0 + 4.0 * amount)
                    - amount * (at(x, up, c) + at(x, down, c) + at(left, y, c) + at(right, y, c));
                rgba[(y * w + x) * CHANNELS + c] = v.max(0.0);
            }
        }
    }
}

/// Converts one source payload into canonical half RGBA texels,
/// applying the requested transparency rule and sharpen filter.
pub(crate) fn convert_pixels(
    resolution: UVec2,
    pixels: &PixelData,
    options: &IngestOptions,
) -> Vec<u16> {
    let mut rgba = to_f32_rgba(pixels);
    apply_transparency(&mut rgba, options);
    if options.sharpen_amount > 0.0 {
        sharpen(&mut rgba, resolution, options.sharpen_amount);
    }
    rgba.iter().map(|&v| f32_to_f16(v)).collect()
}

/// Converts a depth payload into canonical f32 values, rescaled by
/// `depth_scale`.
pub(crate) fn convert_depth(depth: &DepthData, depth_scale: f32) -> Vec<f32> {
    match depth {
        DepthData::UShort(data) => data.iter().map(|&v| v as f32 * depth_scale).collect(),
        DepthData::Float(data) => data.iter().map(|&v| v * depth_scale).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f16_encodes_exact_values() {
        assert_eq!(f32_to_f16(0.0), 0x0000);
        assert_eq!(f32_to_f16(1.0), 0x3c00);
        assert_eq!(f32_to_f16(0.5), 0x3800);
        assert_eq!(f32_to_f16(-2.0), 0xc000);
        assert_eq!(f32_to_f16(65504.0), 0x7bff);
        assert_eq!(f32_to_f16(1e6), 0x7c00);
    }

    #[test]
    fn f16_round_trips_representable_values() {
        for v in [0.0f32, 1.0, -1.0, 0.25, 0.75, 1024.0, -0.125] {
            assert_eq!(f16_to_f32(f32_to_f16(v)), v);
        }
    }

    #[test]
    fn byte_conversion_is_exact_at_extremes() {
        let pixels = PixelData::Byte(vec![0, 128, 255, 255]);
        let out = convert_pixels(UVec2::new(1, 1), &pixels, &IngestOptions::default());
        assert_eq!(f16_to_f32(out[0]), 0.0);
        assert_eq!(f16_to_f32(out[2]), 1.0);
        assert_eq!(f16_to_f32(out[3]), 1.0);
    }

    #[test]
    fn white_transparent_zeroes_alpha() {
        let pixels = PixelData::Byte(vec![255; 4 * 2]);
        let options = IngestOptions {
            white_transparent: true,
            ..Default::default()
        };
        let out = convert_pixels(UVec2::new(2, 1), &pixels, &options);
        assert_eq!(out[3], 0);
        assert_eq!(out[7], 0);
        // Color channels are untouched.
        assert_eq!(f16_to_f32(out[0]), 1.0);
    }

    #[test]
    fn black_transparent_leaves_other_colors() {
        let mut data = vec![0u8; 8];
        data[3] = 255; // black texel, opaque alpha
        data[4] = 200; // non-black texel
        data[7] = 255;
        let options = IngestOptions {
            black_transparent: true,
            ..Default::default()
        };
        let out = convert_pixels(UVec2::new(2, 1), &PixelData::Byte(data), &options);
        assert_eq!(out[3], 0);
        assert_ne!(out[7], 0);
    }

    #[test]
    fn mask_color_keys_out_matching_texels() {
        let data = vec![255, 0, 255, 255, 10, 20, 30, 255];
        let options = IngestOptions {
            mask_color: Some(0xff00ff),
            ..Default::default()
        };
        let out = convert_pixels(UVec2::new(2, 1), &PixelData::Byte(data), &options);
        assert_eq!(out[3], 0);
        assert_ne!(out[7], 0);
    }

    #[test]
    fn uniform_image_is_sharpen_fixed_point() {
        let pixels = PixelData::Float(vec![0.25; 3 * 3 * 4]);
        let options = IngestOptions {
            sharpen_amount: 0.7,
            ..Default::default()
        };
        let out = convert_pixels(UVec2::new(3, 3), &pixels, &options);
        for texel in out.chunks_exact(4) {
            assert_eq!(f16_to_f32(texel[0]), 0.25);
            assert_eq!(f16_to_f32(texel[1]), 0.25);
            assert_eq!(f16_to_f32(texel[2]), 0.25);
        }
    }

    #[test]
    fn sharpen_boosts_contrast_at_edges() {
        // A single bright pixel in a dark field gets brighter.
        let mut data = vec![0.0f32; 3 * 3 * 4];
        let center = (1 * 3 + 1) * 4;
        data[center] = 0.5;
        let options = IngestOptions {
            sharpen_amount: 0.5,
            ..Default::default()
        };
        let out = convert_pixels(UVec2::new(3, 3), &PixelData::Float(data), &options);
        assert!(f16_to_f32(out[center]) > 0.5);
    }

    #[test]
    fn depth_values_scale_into_meters() {
        let depth = DepthData::UShort(vec![0, 1000, 65535]);
        let out = convert_depth(&depth, 0.001);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert!((out[2] - 65.535).abs() < 1e-3);

        let out = convert_depth(&DepthData::Float(vec![2.5]), 2.0);
        assert_eq!(out[0], 5.0);
    }

    #[test]
    fn half_payloads_pass_through() {
        let texels = vec![0x3c00u16, 0x3800, 0x0000, 0x3c00];
        let out = convert_pixels(
            UVec2::new(1, 1),
            &PixelData::Half(texels.clone()),
            &IngestOptions::default(),
        );
        assert_eq!(out, texels);
    }
}
