//! Catalog item types.
//!
//! [`WfmItem`] mirrors the market API's item object; [`CatalogItem`] is the
//! flattened, single-locale form the matcher works with.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Tags that mark a part as something a relic can drop.
const RELIC_CATEGORY_TAGS: &[&str] = &["warframe", "weapon", "archwing", "sentinel"];
const RELIC_PART_TAGS: &[&str] = &["blueprint", "component"];

/// Locale used when an item has no name in the requested one.
pub const FALLBACK_LOCALE: &str = "en";

/// Item as returned by `/v2/items`. Only the fields this tool reads are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WfmItem {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub game_ref: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ducats: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaulted: Option<bool>,
    #[serde(default)]
    pub i18n: HashMap<String, WfmItemI18n>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WfmItemI18n {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
}

impl WfmItem {
    fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// True for prime parts that drop from relics: tagged `prime`, not a set,
    /// of a relic category, and a blueprint or component.
    pub fn is_relic_reward(&self) -> bool {
        self.has_tag("prime")
            && !self.has_tag("set")
            && RELIC_CATEGORY_TAGS.iter().any(|tag| self.has_tag(tag))
            && RELIC_PART_TAGS.iter().any(|tag| self.has_tag(tag))
    }

    /// Display name in `locale`, falling back to English.
    pub fn name(&self, locale: &str) -> Option<&str> {
        self.i18n
            .get(locale)
            .or_else(|| self.i18n.get(FALLBACK_LOCALE))
            .map(|i18n| i18n.name.as_str())
            .filter(|name| !name.trim().is_empty())
    }
}

/// One item the matcher can recognise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    /// Market URL name, used for order lookups.
    pub slug: String,
    /// Display name in the active locale. Words are separated by single spaces.
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ducats: i32,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            name: name.into(),
            tags: Vec::new(),
            ducats: 0,
        }
    }

    /// Flattens a wire item for `locale`. Items without a usable name are skipped.
    pub fn from_wire(item: &WfmItem, locale: &str) -> Option<Self> {
        let name = item.name(locale)?;
        Some(Self {
            id: item.id.clone(),
            slug: item.slug.clone(),
            name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            tags: item.tags.clone(),
            ducats: item.ducats,
        })
    }

    /// The words of the display name, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.name.split_whitespace()
    }
}

/// Forma is a common relic reward but is not listed as a prime part.
pub fn forma_blueprint() -> CatalogItem {
    let mut item = CatalogItem::new("forma", "forma", "Forma Blueprint");
    item.tags.push("forma".to_string());
    item
}

/// Keeps relic rewards in API order and appends [`forma_blueprint`].
pub fn relic_items(items: &[WfmItem], locale: &str) -> Vec<CatalogItem> {
    let mut relic_items: Vec<CatalogItem> = items
        .iter()
        .filter(|item| item.is_relic_reward())
        .filter_map(|item| CatalogItem::from_wire(item, locale))
        .collect();
    relic_items.push(forma_blueprint());
    relic_items
}
