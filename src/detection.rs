//! Reward screen -> catalog items.
//!
//! Crops the reward name strip, runs OCR and hands the text to the matcher,
//! either as two corrected word rows or as one string per reward card.

use anyhow::Result;
use image::{Rgb, RgbaImage};

use crate::catalog::CatalogItem;
use crate::config::{AppConfig, DetectionMode, RelativeRect, RewardRows};
use crate::matching::{Matcher, Row};
use crate::ocr::{self, Binarize, OcrEngine, TokenMode, tokens};

/// Everything the detection pass reads from the config.
#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub mode: DetectionMode,
    pub token_mode: TokenMode,
    pub split_max_distance: usize,
    pub rows: RewardRows,
    pub slots: Vec<RelativeRect>,
    pub binarize: Binarize,
}

impl DetectionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let binarize = match (config.isolate_text_color, config.text_color) {
            (false, _) => Binarize::Bright(config.bright_threshold),
            (true, Some(rgb)) => Binarize::Color {
                target: Rgb(rgb),
                threshold: config.color_threshold,
            },
            (true, None) => Binarize::DetectColor {
                threshold: config.color_threshold,
                fallback: config.bright_threshold,
            },
        };

        Self {
            mode: config.detection_mode,
            token_mode: config.token_mode,
            split_max_distance: config.split_max_distance,
            rows: config.reward_rows,
            slots: config.reward_slots.clone(),
            binarize,
        }
    }
}

/// Identifies the reward items shown in `img`.
pub fn detect_items<'m>(
    img: &RgbaImage,
    engine: &dyn OcrEngine,
    matcher: &'m Matcher,
    settings: &DetectionSettings,
) -> Result<Vec<&'m CatalogItem>> {
    let items = match settings.mode {
        DetectionMode::Rows => detect_rows(img, engine, matcher, settings)?,
        DetectionMode::Slots => detect_slots(img, engine, matcher, settings)?,
    };

    log::info!(
        "Detected {} item(s): {}",
        items.len(),
        items
            .iter()
            .map(|item| item.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(items)
}

fn detect_rows<'m>(
    img: &RgbaImage,
    engine: &dyn OcrEngine,
    matcher: &'m Matcher,
    settings: &DetectionSettings,
) -> Result<Vec<&'m CatalogItem>> {
    let mut rows = Vec::with_capacity(2);
    for region in [&settings.rows.upper, &settings.rows.lower] {
        let lines = ocr::read_region_lines(engine, img, region, settings.binarize)?;
        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        rows.push(correct_text(matcher, &text, settings));
    }

    let lower = rows.pop().unwrap_or_default();
    let upper = rows.pop().unwrap_or_default();
    log::debug!("Rows: {:?} / {:?}", upper.words(), lower.words());
    Ok(matcher.resolve_rows(upper, lower))
}

fn detect_slots<'m>(
    img: &RgbaImage,
    engine: &dyn OcrEngine,
    matcher: &'m Matcher,
    settings: &DetectionSettings,
) -> Result<Vec<&'m CatalogItem>> {
    let mut items = Vec::new();
    for (index, region) in settings.slots.iter().enumerate() {
        let text = ocr::read_region_text(engine, img, region, settings.binarize)?;
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            log::debug!("Slot {} is empty", index + 1);
            continue;
        }
        match matcher.match_text(&text) {
            Some(item) => items.push(item),
            None => log::debug!("Slot {}: no match for {:?}", index + 1, text),
        }
    }
    Ok(items)
}

/// Turns OCR text into a row of legal words.
///
/// In case-split mode a token that does not correct as a whole is cut at
/// case changes and each piece is corrected with the looser split threshold.
pub fn correct_text(matcher: &Matcher, text: &str, settings: &DetectionSettings) -> Row {
    let tokens = tokens::split_words(text);
    if settings.token_mode != TokenMode::CaseSplit {
        return matcher.correct_row(&tokens);
    }

    let corrector = matcher.corrector();
    let mut words: Vec<String> = Vec::new();
    for token in tokens {
        if let Some(word) = corrector.correct(&token) {
            words.push(word.to_string());
            continue;
        }

        let parts = tokens::split_case_boundaries(&token);
        let row = matcher.correct_row_within(&parts, settings.split_max_distance);
        if row.len() < parts.len() {
            log::debug!("Rejected parts of OCR token {:?}: {:?}", token, parts);
        }
        words.extend(row.words().iter().cloned());
    }

    Row::new(words)
}
