use std::collections::HashMap;

use image::{GrayImage, Luma, Rgb, RgbaImage};

use crate::config::RelativeRect;

/// Pixels whose brightest channel is below this are never text.
const MIN_TEXT_BRIGHTNESS: u8 = 100;

/// Converts image to binary by keeping only bright pixels.
///
/// Pixels where R > threshold AND G > threshold AND B > threshold become black (text).
/// All other pixels become white (background).
///
/// Works for the default white-text UI themes. Coloured themes need
/// [`isolate_target_color`].
pub fn threshold_bright_pixels(img: &RgbaImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let value = if r > threshold && g > threshold && b > threshold {
            0u8
        } else {
            255u8
        };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Guesses the UI theme's text colour: the most frequent bright colour.
///
/// Reward text is the only large bright area of the name strip, so the mode
/// of the bright pixels is the text colour. Ties go to the brighter colour.
/// Returns `None` when nothing in the image is bright enough.
pub fn detect_text_color(img: &RgbaImage) -> Option<Rgb<u8>> {
    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
    for pixel in img.pixels() {
        let [r, g, b, _] = pixel.0;
        if r.max(g).max(b) >= MIN_TEXT_BRIGHTNESS {
            *counts.entry([r, g, b]).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .max_by_key(|&(rgb, count)| (count, brightness(rgb), rgb))
        .map(|(rgb, _)| Rgb(rgb))
}

fn brightness([r, g, b]: [u8; 3]) -> u32 {
    r as u32 + g as u32 + b as u32
}

/// Black where a pixel is within `threshold` (Euclidean RGB distance) of
/// `target`, white elsewhere.
pub fn isolate_target_color(img: &RgbaImage, target: Rgb<u8>, threshold: f64) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let dr = r as f64 - target[0] as f64;
        let dg = g as f64 - target[1] as f64;
        let db = b as f64 - target[2] as f64;
        let distance = (dr * dr + dg * dg + db * db).sqrt();

        let value = if distance <= threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// How a cropped region is turned into black text on white.
#[derive(Debug, Clone, Copy)]
pub enum Binarize {
    /// Keep pixels brighter than the threshold on every channel.
    Bright(u8),
    /// Keep pixels close to a known text colour.
    Color { target: Rgb<u8>, threshold: f64 },
    /// Detect the text colour first, falling back to the bright threshold.
    DetectColor { threshold: f64, fallback: u8 },
}

pub fn binarize(img: &RgbaImage, mode: Binarize) -> GrayImage {
    match mode {
        Binarize::Bright(threshold) => threshold_bright_pixels(img, threshold),
        Binarize::Color { target, threshold } => isolate_target_color(img, target, threshold),
        Binarize::DetectColor {
            threshold,
            fallback,
        } => match detect_text_color(img) {
            Some(target) => {
                log::debug!("Detected text colour {:?}", target.0);
                isolate_target_color(img, target, threshold)
            }
            None => threshold_bright_pixels(img, fallback),
        },
    }
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect (0.0 to 1.0) to absolute pixel coordinates,
/// clamps to image bounds, and returns the cropped sub-image.
pub fn crop_region(img: &RgbaImage, region: &RelativeRect) -> RgbaImage {
    let (w, h) = img.dimensions();

    let x0 = ((region.x.max(0.0) * w as f32) as u32).min(w);
    let y0 = ((region.y.max(0.0) * h as f32) as u32).min(h);
    let rw = ((region.width.max(0.0) * w as f32) as u32).min(w - x0);
    let rh = ((region.height.max(0.0) * h as f32) as u32).min(h - y0);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}
