pub mod engine;
pub mod preprocess;
pub mod setup;
pub mod tokens;

pub use engine::{OcrEngine, OcrLine, TesseractCli};
pub use preprocess::{Binarize, binarize, crop_region};
pub use setup::ensure_tesseract;
pub use tokens::TokenMode;

use anyhow::Result;
use image::RgbaImage;

use crate::config::RelativeRect;

/// Crops `region`, binarizes it and returns its recognized text lines.
pub fn read_region_lines(
    engine: &dyn OcrEngine,
    img: &RgbaImage,
    region: &RelativeRect,
    mode: Binarize,
) -> Result<Vec<OcrLine>> {
    let cropped = crop_region(img, region);
    let binary = binarize(&cropped, mode);
    engine.recognize_lines(&binary)
}

/// Crops `region`, binarizes it and returns the recognized text as one string.
pub fn read_region_text(
    engine: &dyn OcrEngine,
    img: &RgbaImage,
    region: &RelativeRect,
    mode: Binarize,
) -> Result<String> {
    let cropped = crop_region(img, region);
    let binary = binarize(&cropped, mode);
    let text = engine.recognize_text(&binary)?;
    log::debug!(
        "OCR region x={:.3} y={:.3}: {:?}",
        region.x,
        region.y,
        text.trim()
    );
    Ok(text)
}
