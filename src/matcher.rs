use image::{imageops::{self, FilterType}, GrayImage, ImageBuffer, Luma};
use imageproc::template_matching::{match_template, MatchTemplateMethod};

use std::fmt;
use std::str::FromStr;

use crate::error::{LprError, LprErrorKind, LprResult};

/// How a test character is compared against a template of the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Zero-mean normalized cross-correlation, invariant to brightness and contrast.
    CorrelationCoefficientNormed,
    /// Normalized cross-correlation on the raw intensities.
    CrossCorrelationNormed,
}

impl Default for MatchMethod {
    fn default() -> Self {
        MatchMethod::CorrelationCoefficientNormed
    }
}

impl FromStr for MatchMethod {
    type Err = LprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ccoeff-normed" => Ok(MatchMethod::CorrelationCoefficientNormed),
            "ccorr-normed" => Ok(MatchMethod::CrossCorrelationNormed),
            _ => Err(LprErrorKind::UnknownMethod(s.to_string()).into()),
        }
    }
}

impl fmt::Display for MatchMethod {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::CorrelationCoefficientNormed => f.write_str("ccoeff-normed"),
            MatchMethod::CrossCorrelationNormed => f.write_str("ccorr-normed"),
        }
    }
}

/// Resize `img` to exactly the template's dimensions.
///
/// Shrinking averages the covered source area, enlarging (on either axis) falls
/// back to a bilinear filter.
pub fn resize_to_template(img: &GrayImage, template: &GrayImage) -> GrayImage {
    let (width, height) = template.dimensions();
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    if width <= img.width() && height <= img.height() {
        resize_area(img, width, height)
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}

/// Score two images of equal size, higher is more similar.
pub fn score(img: &GrayImage, template: &GrayImage, method: MatchMethod) -> LprResult<f32> {
    if img.dimensions() != template.dimensions() {
        return Err(LprErrorKind::SizeMismatch {
            image: img.dimensions(),
            template: template.dimensions(),
        }.into());
    }
    if img.width() == 0 || img.height() == 0 {
        return Err(LprErrorKind::InvalidParameter("can not score an empty image".to_string()).into());
    }

    let score = match method {
        MatchMethod::CorrelationCoefficientNormed => correlation_coefficient(img, template),
        MatchMethod::CrossCorrelationNormed => {
            // equal sizes leave a single offset to evaluate
            let response = match_template(img, template, MatchTemplateMethod::CrossCorrelationNormalized);
            response.get_pixel(0, 0)[0]
        }
    };
    Ok(if score.is_finite() { score } else { 0.0 })
}

/// Pearson correlation of the pixel values.
///
/// Either side being flat gives 0. Rounding noise that pushes the ratio slightly
/// past 1 is clamped to ±1.
fn correlation_coefficient(img: &GrayImage, template: &GrayImage) -> f32 {
    let n = img.len() as f64;
    let (mut si, mut st, mut sii, mut stt, mut sit) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (i, t) in img.iter().zip(template.iter()) {
        let (i, t) = (*i as f64, *t as f64);
        si += i;
        st += t;
        sii += i * i;
        stt += t * t;
        sit += i * t;
    }

    let num = sit - si * st / n;
    let img_norm = (sii - si * si / n).max(0.0).sqrt();
    let template_norm = (stt - st * st / n).max(0.0).sqrt();
    let denom = img_norm * template_norm;

    let score = if num.abs() < denom {
        num / denom
    } else if num.abs() < denom * 1.125 {
        num.signum()
    } else {
        0.0
    };
    score as f32
}

/// Source taps and weights covering each destination pixel along one axis.
fn area_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    let src_len = src_len as usize;
    (0..dst_len).map(|d| {
        let start = d as f64 * scale;
        let end = start + scale;
        let cell = scale.min(src_len as f64 - start);
        let first = start.ceil() as usize;
        let last = (end.floor() as usize).min(src_len);

        let mut taps = Vec::new();
        if first as f64 - start > 1e-3 && first > 0 {
            taps.push((first - 1, (first as f64 - start) / cell));
        }
        for s in first..last {
            taps.push((s, 1.0 / cell));
        }
        if end - last as f64 > 1e-3 && last < src_len {
            taps.push((last, (end - last as f64).min(1.0).min(cell) / cell));
        }
        taps
    }).collect()
}

fn resize_area(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    let src_width = img.width() as usize;
    let x_taps = area_weights(img.width(), width);
    let y_taps = area_weights(img.height(), height);

    // shrink rows first, then columns
    let mut rows = vec![0.0f64; width as usize * img.height() as usize];
    for y in 0..img.height() as usize {
        let src = &img.as_raw()[y * src_width..(y + 1) * src_width];
        for (x, taps) in x_taps.iter().enumerate() {
            rows[y * width as usize + x] = taps.iter().map(|(s, w)| src[*s] as f64 * w).sum();
        }
    }

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for taps in y_taps.iter() {
        for x in 0..width as usize {
            let v: f64 = taps.iter().map(|(s, w)| rows[s * width as usize + x] * w).sum();
            pixels.push(v.round().max(0.0).min(255.0) as u8);
        }
    }
    ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, pixels)
        .unwrap_or_else(|| GrayImage::new(width, height))
}
