use crate::dclib::Image;
use rayon::prelude::*;

/// 5x5 binomial approximation of a gaussian
const GAUSSIAN_KERNEL: [[u32; 5]; 5] = [
    [1, 4, 6, 4, 1],
    [4, 16, 24, 16, 4],
    [6, 24, 36, 24, 6],
    [4, 16, 24, 16, 4],
    [1, 4, 6, 4, 1],
];
const GAUSSIAN_SUM: u32 = 256;

/// 3x3 mean over interior pixels. The one pixel border is copied as-is.
pub fn box_blur(image: &Image) -> Image {
    let (rows, cols) = image.shape();
    let mut out = image.pixels().to_vec();
    for i in 1..rows.saturating_sub(1) {
        for j in 1..cols.saturating_sub(1) {
            let mut sum: u32 = 0;
            for ki in i - 1..=i + 1 {
                for kj in j - 1..=j + 1 {
                    sum += image.get(ki, kj) as u32;
                }
            }
            out[i * cols + j] = (sum / 9) as u8;
        }
    }
    image.with_pixels(out)
}

/// Multiply every pixel by `gain`, truncating and saturating to [0, 255]
pub fn stretch_contrast(image: &Image, gain: f64) -> Image {
    let out = image
        .pixels()
        .iter()
        .map(|&p| (p as f64 * gain).clamp(0.0, 255.0) as u8)
        .collect();
    image.with_pixels(out)
}

/// 5x5 gaussian blur over interior pixels. The two pixel border is copied as-is.
pub fn gaussian_blur(image: &Image) -> Image {
    let (rows, cols) = image.shape();
    let mut out = image.pixels().to_vec();
    for i in 2..rows.saturating_sub(2) {
        for j in 2..cols.saturating_sub(2) {
            let mut sum: u32 = 0;
            for (ki, krow) in GAUSSIAN_KERNEL.iter().enumerate() {
                for (kj, &w) in krow.iter().enumerate() {
                    sum += image.get(i + ki - 2, j + kj - 2) as u32 * w;
                }
            }
            out[i * cols + j] = (sum / GAUSSIAN_SUM) as u8;
        }
    }
    image.with_pixels(out)
}

/// Unsharp mask: `original + (original - blurred)`, clamped
pub fn unsharp_mask(image: &Image) -> Image {
    let blurred = gaussian_blur(image);
    let out = image
        .pixels()
        .iter()
        .zip(blurred.pixels())
        .map(|(&o, &b)| (2 * o as i32 - b as i32).clamp(0, 255) as u8)
        .collect();
    image.with_pixels(out)
}

/// Denoise then boost contrast on every image before clustering
pub fn preprocess(images: &[Image], gain: f64) -> Vec<Image> {
    images
        .par_iter()
        .map(|img| stretch_contrast(&box_blur(img), gain))
        .collect()
}

/// Sharpen final centroids for presentation
pub fn postprocess(images: &[Image]) -> Vec<Image> {
    images.par_iter().map(unsharp_mask).collect()
}
