//! Zero-mean normalized cross-correlation template matching over grayscale
//! frames.
//!
//! Both sides are mean-subtracted before correlating, so a flat template
//! never fires and a flat stretch of screen never scores against anything.
//! Matches are reported in scan order (row-major) and are deliberately not
//! deduplicated: adjacent score-map pixels that all clear the threshold each
//! produce their own match, and therefore their own click.

use image::GrayImage;
use rayon::prelude::*;

use crate::surface::Region;

// Below this a window or template has no contrast to correlate against.
const FLAT_STD_EPS: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateMatch {
    /// Top-left corner of the matched window within the frame.
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// All positions whose correlation score is at or above `threshold`.
///
/// Scores are zero-mean NCC: `sum((I - mean(I)) * (T - mean(T))) /
/// (n * std(I) * std(T))` per window, so they live in [-1, 1] and a window
/// of constant color scores 0 rather than 1. A template with no contrast
/// at all matches nothing.
///
/// The caller must guarantee the template fits inside the frame; the engine
/// skips oversized templates before getting here.
pub fn find_matches(frame: &GrayImage, template: &GrayImage, threshold: f32) -> Vec<TemplateMatch> {
    let (frame_w, frame_h) = frame.dimensions();
    let (template_w, template_h) = template.dimensions();
    let out_w = (frame_w - template_w + 1) as usize;
    let out_h = (frame_h - template_h + 1) as usize;

    let n = (template_w * template_h) as f32;
    let pixels: Vec<f32> = template.as_raw().iter().map(|&p| p as f32).collect();
    let template_mean = pixels.iter().sum::<f32>() / n;
    let template_std = (pixels
        .iter()
        .map(|&p| (p - template_mean).powi(2))
        .sum::<f32>()
        / n)
        .sqrt();

    if template_std < FLAT_STD_EPS {
        return Vec::new();
    }

    let centered: Vec<f32> = pixels.iter().map(|&p| p - template_mean).collect();

    let mut scores = vec![0.0f32; out_w * out_h];
    scores
        .par_chunks_mut(out_w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, score) in row.iter_mut().enumerate() {
                *score = score_at(
                    frame,
                    x as u32,
                    y as u32,
                    &centered,
                    template_w,
                    template_h,
                    n,
                    template_std,
                );
            }
        });

    let mut matches = Vec::new();
    for y in 0..out_h {
        for x in 0..out_w {
            let score = scores[y * out_w + x];
            if score >= threshold {
                matches.push(TemplateMatch {
                    x: x as u32,
                    y: y as u32,
                    score,
                });
            }
        }
    }

    matches
}

fn score_at(
    frame: &GrayImage,
    x: u32,
    y: u32,
    centered: &[f32],
    template_w: u32,
    template_h: u32,
    n: f32,
    template_std: f32,
) -> f32 {
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut cross = 0.0f32;

    for ty in 0..template_h {
        for tx in 0..template_w {
            let pixel = frame.get_pixel(x + tx, y + ty)[0] as f32;
            sum += pixel;
            sum_sq += pixel * pixel;
            // sum(T - mean(T)) is zero, so correlating against the centered
            // template already subtracts the window mean from the product.
            cross += pixel * centered[(ty * template_w + tx) as usize];
        }
    }

    let window_mean = sum / n;
    let window_std = (sum_sq / n - window_mean * window_mean).max(0.0).sqrt();

    if window_std < FLAT_STD_EPS {
        return 0.0;
    }

    cross / (n * window_std * template_std)
}

pub fn template_fits(frame: &GrayImage, template: &GrayImage) -> bool {
    template.width() <= frame.width() && template.height() <= frame.height()
}

/// Center of the matched window in screen coordinates: half the template
/// size (integer division), offset by the capture region's origin when a
/// sub-region was grabbed.
pub fn click_point(found: &TemplateMatch, template: &GrayImage, region: Option<Region>) -> (i32, i32) {
    let (offset_x, offset_y) = match region {
        Some(region) => (region.x, region.y),
        None => (0, 0),
    };

    (
        (found.x + template.width() / 2) as i32 + offset_x,
        (found.y + template.height() / 2) as i32 + offset_y,
    )
}
