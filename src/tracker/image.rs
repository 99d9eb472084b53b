//! Grayscale frame helpers: color conversion and bilinear resampling.

use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

/// Grayscale image stored as `(height, width)`.
pub type GrayImage = Array2<u8>;

/// Convert a `(height, width, channels)` frame to grayscale.
///
/// Single-channel frames are copied. Three- and four-channel frames are read
/// as RGB(A) and weighted with the BT.601 luma coefficients. Returns `None`
/// for any other channel count.
pub fn to_grayscale(frame: ArrayView3<'_, u8>) -> Option<GrayImage> {
    let (height, width, channels) = frame.dim();
    match channels {
        1 => Some(frame.index_axis(Axis(2), 0).to_owned()),
        3 | 4 => Some(Array2::from_shape_fn((height, width), |(y, x)| {
            let r = frame[[y, x, 0]] as f32;
            let g = frame[[y, x, 1]] as f32;
            let b = frame[[y, x, 2]] as f32;
            (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8
        })),
        _ => None,
    }
}

/// Resample `src` to `width x height` with pixel-center aligned bilinear
/// interpolation, writing into `dst` and reusing its buffer when the shape
/// already matches.
pub fn resize_bilinear_into(src: ArrayView2<'_, u8>, width: usize, height: usize, dst: &mut GrayImage) {
    if dst.dim() != (height, width) {
        *dst = Array2::zeros((height, width));
    }
    let (src_h, src_w) = src.dim();
    if src_h == 0 || src_w == 0 || width == 0 || height == 0 {
        dst.fill(0);
        return;
    }
    if (src_h, src_w) == (height, width) {
        dst.assign(&src);
        return;
    }

    let scale_x = src_w as f32 / width as f32;
    let scale_y = src_h as f32 / height as f32;

    for y in 0..height {
        let fy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
        let y0 = (fy.floor() as usize).min(src_h - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let wy = (fy - y0 as f32).clamp(0.0, 1.0);

        for x in 0..width {
            let fx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
            let x0 = (fx.floor() as usize).min(src_w - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let wx = (fx - x0 as f32).clamp(0.0, 1.0);

            let top = src[[y0, x0]] as f32 * (1.0 - wx) + src[[y0, x1]] as f32 * wx;
            let bottom = src[[y1, x0]] as f32 * (1.0 - wx) + src[[y1, x1]] as f32 * wx;
            let value = top * (1.0 - wy) + bottom * wy;
            dst[[y, x]] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Allocating variant of [`resize_bilinear_into`].
pub fn resize_bilinear(src: ArrayView2<'_, u8>, width: usize, height: usize) -> GrayImage {
    let mut dst = Array2::zeros((height, width));
    resize_bilinear_into(src, width, height, &mut dst);
    dst
}
