//! Application configuration.
//!
//! Loads settings from a JSON file at startup. Every field has a default, so
//! a partial file (or none at all) is valid. Regions are relative to the
//! captured screen so they work at any resolution with the same aspect ratio.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::client::DEFAULT_BASE_URL;
use crate::ocr::TokenMode;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// A rectangle in relative coordinates (0.0 to 1.0).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of screen width
    pub width: f32,
    /// Height as fraction of screen height
    pub height: f32,
}

impl RelativeRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The two text lines under the reward cards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardRows {
    pub upper: RelativeRect,
    pub lower: RelativeRect,
}

impl Default for RewardRows {
    fn default() -> Self {
        // 1920x1080 layout: names start at (480, 410), 965 px wide, 25 px per line.
        Self {
            upper: RelativeRect::new(0.25, 0.3796, 0.5026, 0.0232),
            lower: RelativeRect::new(0.25, 0.4028, 0.5026, 0.0232),
        }
    }
}

/// Which OCR pipeline runs on a reward screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Two text rows, word-corrected and resolved through the name trie.
    #[default]
    Rows,
    /// One box per reward card, each aligned against every catalog name.
    Slots,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog locale for item names
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Explicit path to EE.log; derived from `steam_library` when unset
    #[serde(default)]
    pub log_file: Option<String>,
    /// Steam library holding the Warframe Proton prefix
    #[serde(default = "default_steam_library")]
    pub steam_library: String,
    /// Minimum time between two detections
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// How often the log file is checked for new lines
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Wait after a trigger line before capturing, so the reward screen is drawn
    #[serde(default = "default_capture_delay_ms")]
    pub capture_delay_ms: u64,
    /// Log line fragments that mean the reward screen is open
    #[serde(default = "default_trigger_patterns")]
    pub trigger_patterns: Vec<String>,
    /// Screenshot command; `{output}` is replaced with the PNG path to write
    #[serde(default = "default_capture_command")]
    pub capture_command: Vec<String>,
    #[serde(default)]
    pub detection_mode: DetectionMode,
    #[serde(default)]
    pub token_mode: TokenMode,
    /// Max edit distance when correcting a whitespace-separated OCR word
    #[serde(default = "default_word_max_distance")]
    pub word_max_distance: usize,
    /// Max edit distance for words cut out of a run-together token
    #[serde(default = "default_split_max_distance")]
    pub split_max_distance: usize,
    #[serde(default)]
    pub reward_rows: RewardRows,
    #[serde(default = "default_reward_slots")]
    pub reward_slots: Vec<RelativeRect>,
    /// Isolate the theme's text colour; when false only `bright_threshold` is used
    #[serde(default = "default_isolate_text_color")]
    pub isolate_text_color: bool,
    /// Text colour of the UI theme; detected per screen when unset
    #[serde(default)]
    pub text_color: Option<[u8; 3]>,
    /// Euclidean RGB distance from the text colour still counted as text
    #[serde(default = "default_color_threshold")]
    pub color_threshold: f64,
    /// Fallback brightness threshold (pixels with R, G, B all > threshold are kept)
    #[serde(default = "default_bright_threshold")]
    pub bright_threshold: u8,
    #[serde(default)]
    pub tesseract_path: Option<String>,
    #[serde(default)]
    pub tessdata_dir: Option<String>,
    /// Tesseract language code
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Cached item list younger than this is used without asking the server
    #[serde(default = "default_catalog_ttl_hours")]
    pub catalog_ttl_hours: i64,
    #[serde(default = "default_show_prices")]
    pub show_prices: bool,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_steam_library() -> String {
    "~/.local/share/Steam".to_string()
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_capture_delay_ms() -> u64 {
    500
}

fn default_trigger_patterns() -> Vec<String> {
    [
        "VoidProjections: OpenVoidProjectionRewardScreenRMI",
        "ProjectionRewardChoice.lua: Relic rewards initialized",
        "VoidProjections: GetVoidProjectionRewards",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_capture_command() -> Vec<String> {
    ["import", "-window", "root", "{output}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_word_max_distance() -> usize {
    2
}

fn default_split_max_distance() -> usize {
    3
}

fn default_reward_slots() -> Vec<RelativeRect> {
    // Four cards side by side across the same strip as the rows.
    let RewardRows { upper, .. } = RewardRows::default();
    let width = upper.width / 4.0;
    (0..4)
        .map(|i| RelativeRect::new(upper.x + width * i as f32, upper.y, width, upper.height * 2.0))
        .collect()
}

fn default_isolate_text_color() -> bool {
    true
}

fn default_color_threshold() -> f64 {
    70.0
}

fn default_bright_threshold() -> u8 {
    190
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_catalog_ttl_hours() -> i64 {
    24
}

fn default_show_prices() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            log_file: None,
            steam_library: default_steam_library(),
            cooldown_secs: default_cooldown_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            capture_delay_ms: default_capture_delay_ms(),
            trigger_patterns: default_trigger_patterns(),
            capture_command: default_capture_command(),
            detection_mode: DetectionMode::default(),
            token_mode: TokenMode::default(),
            word_max_distance: default_word_max_distance(),
            split_max_distance: default_split_max_distance(),
            reward_rows: RewardRows::default(),
            reward_slots: default_reward_slots(),
            isolate_text_color: default_isolate_text_color(),
            text_color: None,
            color_threshold: default_color_threshold(),
            bright_threshold: default_bright_threshold(),
            tesseract_path: None,
            tessdata_dir: None,
            ocr_language: default_ocr_language(),
            api_base_url: default_api_base_url(),
            catalog_ttl_hours: default_catalog_ttl_hours(),
            show_prices: default_show_prices(),
        }
    }
}

impl AppConfig {
    /// How long the item cache is trusted. Values too large for a duration
    /// fall back to the default.
    pub fn catalog_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.catalog_ttl_hours).unwrap_or_else(|| {
            log::warn!(
                "catalog_ttl_hours {} is out of range, using {}",
                self.catalog_ttl_hours,
                default_catalog_ttl_hours()
            );
            chrono::Duration::hours(default_catalog_ttl_hours())
        })
    }
}

/// Reads a config file. Errors are returned, not defaulted.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Loads the config at `path` (or the default location), falling back to
/// defaults when the file is missing or invalid.
fn load_config(path: Option<&Path>) -> AppConfig {
    let config_path: PathBuf = path
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::paths::get_config_path);

    log::debug!("Looking for config at: {}", config_path.display());

    if !config_path.exists() {
        log::info!("{} not found. Using default config.", config_path.display());
        return AppConfig::default();
    }

    match load_config_from(&config_path) {
        Ok(config) => {
            log::info!("Config loaded from {}", config_path.display());
            config
        }
        Err(e) => {
            log::warn!("{:#}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config(path: Option<&Path>) {
    let _ = CONFIG.set(load_config(path));
}

/// Returns the global configuration, or defaults if [`init_config`] was never called.
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::default)
}
