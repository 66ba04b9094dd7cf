//! Normalization applied to every test and template image before matching.
//!
//! equalize histogram -> gaussian blur -> adaptive threshold
//!
//! Border modes and rounding are fixed per step (reflect for the blur, replicate
//! for the threshold mean, round half away from zero), the scores depend on them.

use image::{GrayImage, ImageBuffer, Luma};

use crate::error::{LprErrorKind, LprResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
    /// Side of the square smoothing kernel, odd.
    pub blur_kernel: u32,
    /// Side of the adaptive threshold neighbourhood, odd and at least 3.
    pub block_size: u32,
    /// Subtracted from the local mean before comparing.
    pub offset: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { blur_kernel: 5, block_size: 11, offset: 2.0 }
    }
}

impl PreprocessConfig {

    pub fn validate(&self) -> LprResult<()> {
        if self.blur_kernel % 2 == 0 {
            return Err(LprErrorKind::InvalidParameter(
                format!("blur kernel must be odd, got {}", self.blur_kernel)).into());
        }
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(LprErrorKind::InvalidParameter(
                format!("block size must be odd and >= 3, got {}", self.block_size)).into());
        }
        if !self.offset.is_finite() {
            return Err(LprErrorKind::InvalidParameter(
                format!("offset must be finite, got {}", self.offset)).into());
        }
        Ok(())
    }
}

/// Binarize `img` into 0/255 with the same dimensions.
pub fn preprocess(img: &GrayImage, config: &PreprocessConfig) -> GrayImage {
    let img = equalize_histogram(img);
    let img = gaussian_blur(&img, config.blur_kernel);
    adaptive_threshold(&img, config.block_size, config.offset)
}

/// Spread the intensities over 0..=255 with the cumulative histogram.
///
/// A single-level image has nothing to spread and comes back unchanged.
pub fn equalize_histogram(img: &GrayImage) -> GrayImage {
    let total = img.len();
    if total == 0 {
        return img.clone();
    }

    // 分布函数
    let mut df = [0usize; 256];
    for v in img.iter() {
        df[*v as usize] += 1;
    }
    let cdf_min = match df.iter().find(|v| **v != 0) {
        Some(v) => *v,
        None => return img.clone(),
    };
    if cdf_min == total {
        return img.clone();
    }
    // cdf
    let mut temp = df[0];
    df.iter_mut().skip(1).for_each(|v| {
        *v += temp;
        temp = *v;
    });

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    lut.iter_mut().zip(df.iter()).for_each(|(l, cdf)| {
        *l = (cdf.saturating_sub(cdf_min) as f64 * scale).round().min(255.0) as u8;
    });

    let mut out = img.clone();
    out.iter_mut().for_each(|v| *v = lut[*v as usize]);
    out
}

/// Smooth with a `ksize`×`ksize` gaussian whose sigma is derived from the size,
/// reflecting at the border (`dcb|abcd|cba`).
pub fn gaussian_blur(img: &GrayImage, ksize: u32) -> GrayImage {
    let kernel = gaussian_kernel(ksize);
    let smoothed = separable_filter(img, &kernel, Border::Reflect101);
    to_luma(img.width(), img.height(), smoothed)
}

/// Local gaussian-weighted threshold.
///
/// A pixel turns white when it is brighter than its `block_size` neighbourhood
/// mean minus `offset`, black otherwise. The border replicates edge pixels.
pub fn adaptive_threshold(img: &GrayImage, block_size: u32, offset: f64) -> GrayImage {
    let kernel = gaussian_kernel(block_size);
    let mean = to_luma(img.width(), img.height(), separable_filter(img, &kernel, Border::Replicate));
    let delta = offset.ceil() as i32;

    let mut out = GrayImage::new(img.width(), img.height());
    out.iter_mut().zip(img.iter().zip(mean.iter())).for_each(|(o, (src, mean))| {
        *o = if *src as i32 - *mean as i32 > -delta { 255 } else { 0 };
    });
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Border {
    Reflect101,
    Replicate,
}

impl Border {

    fn index(self, i: isize, len: usize) -> usize {
        let n = len as isize;
        if n == 1 {
            return 0;
        }
        match self {
            Border::Replicate => i.max(0).min(n - 1) as usize,
            Border::Reflect101 => {
                let mut i = i;
                while i < 0 || i >= n {
                    if i < 0 {
                        i = -i;
                    }
                    if i >= n {
                        i = 2 * n - 2 - i;
                    }
                }
                i as usize
            }
        }
    }
}

/// 1-D gaussian taps of odd length `ksize`, summing to one.
///
/// Up to 7 taps the binomial tables are used, beyond that
/// sigma = 0.3 * ((ksize - 1) * 0.5 - 1) + 0.8.
pub fn gaussian_kernel(ksize: u32) -> Vec<f64> {
    match ksize {
        0 | 1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => {
            let sigma = 0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8;
            let scale = -0.5 / (sigma * sigma);
            let center = (ksize as f64 - 1.0) * 0.5;
            let taps: Vec<f64> = (0..ksize)
                .map(|i| {
                    let x = i as f64 - center;
                    (scale * x * x).exp()
                })
                .collect();
            let sum: f64 = taps.iter().sum();
            taps.into_iter().map(|t| t / sum).collect()
        }
    }
}

/// Horizontal pass then vertical pass, kept in floating point until the end.
fn separable_filter(img: &GrayImage, kernel: &[f64], border: Border) -> Vec<f64> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let radius = (kernel.len() / 2) as isize;
    let src: Vec<f64> = img.iter().map(|v| *v as f64).collect();

    let mut horizontal = vec![0.0; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = kernel.iter().enumerate().map(|(k, w)| {
                let sx = border.index(x as isize + k as isize - radius, width);
                w * row[sx]
            }).sum();
        }
    }

    let mut vertical = vec![0.0; width * height];
    for y in 0..height {
        for x in 0..width {
            vertical[y * width + x] = kernel.iter().enumerate().map(|(k, w)| {
                let sy = border.index(y as isize + k as isize - radius, height);
                w * horizontal[sy * width + x]
            }).sum();
        }
    }
    vertical
}

fn to_luma(width: u32, height: u32, values: Vec<f64>) -> GrayImage {
    let pixels: Vec<u8> = values.into_iter().map(|v| v.round().max(0.0).min(255.0) as u8).collect();
    ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, pixels)
        .unwrap_or_else(|| GrayImage::new(width, height))
}
