//! Relic reward catalog: fetched from warframe.market, cached on disk.

pub mod cache;
pub mod client;
pub mod item;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Local};

pub use self::cache::CachedItems;
pub use self::client::{MarketClient, TopOrders};
pub use self::item::{CatalogItem, WfmItem, relic_items};

/// The parts of the market API the catalog needs.
pub trait ItemSource {
    /// Current item collection version.
    fn items_version(&self) -> Result<String>;
    fn items(&self) -> Result<Vec<WfmItem>>;
}

impl ItemSource for MarketClient {
    fn items_version(&self) -> Result<String> {
        Ok(self.fetch_versions()?.collections.items)
    }

    fn items(&self) -> Result<Vec<WfmItem>> {
        self.fetch_items()
    }
}

/// Relic rewards in one locale.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Server item collection version. Empty when unknown.
    pub version: String,
    pub items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(version: impl Into<String>, items: Vec<CatalogItem>) -> Self {
        Self {
            version: version.into(),
            items,
        }
    }

    fn from_wire(version: &str, items: &[WfmItem], locale: &str) -> Self {
        Self::new(version, relic_items(items, locale))
    }

    /// Identifies the catalog contents: the server version when known,
    /// otherwise a hash of the item names.
    pub fn fingerprint(&self) -> String {
        if !self.version.is_empty() {
            return self.version.clone();
        }
        let mut hasher = DefaultHasher::new();
        for item in &self.items {
            item.name.hash(&mut hasher);
        }
        format!("names-{:016x}", hasher.finish())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Where and how the catalog is loaded.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub cache_path: PathBuf,
    pub locale: String,
    pub ttl: Duration,
    /// Ignore a fresh cache and ask the server.
    pub refresh: bool,
}

/// Loads the catalog, preferring the cache.
///
/// A cache younger than the TTL is used as is. Otherwise the server version
/// is checked: an unchanged version reuses the cached items, a new one
/// downloads the item list. A cache requested in another locale is never
/// reused while the server is reachable. When the server cannot be reached
/// any cached items are used regardless of age or locale.
pub fn load_catalog(source: &dyn ItemSource, options: &CatalogOptions) -> Result<Catalog> {
    let cached = cache::load(&options.cache_path)?;
    let same_locale = cached
        .as_ref()
        .is_some_and(|cached| cached.locale == options.locale);
    if cached.is_some() && !same_locale {
        log::info!("Item cache was written for another locale, refreshing");
    }

    if let Some(cached) = &cached {
        if same_locale && !options.refresh && cached.is_fresh(options.ttl, Local::now()) {
            log::debug!("Using cached items from {}", cached.timestamp.format("%Y-%m-%d %H:%M"));
            return Ok(Catalog::from_wire(&cached.version, &cached.items, &options.locale));
        }
    }

    let version = match source.items_version() {
        Ok(version) => version,
        Err(e) => {
            return match cached {
                Some(cached) => {
                    log::warn!("Could not check item version ({:#}), using cached items", e);
                    Ok(Catalog::from_wire(&cached.version, &cached.items, &options.locale))
                }
                None => Err(e.context("No cached items and the item version check failed")),
            };
        }
    };

    if let Some(cached) = cached {
        if same_locale && !version.is_empty() && cached.version == version {
            log::info!("Item list unchanged (version {})", version);
            let cached = CachedItems::new(version, cached.locale, cached.items);
            save_quietly(options, &cached);
            return Ok(Catalog::from_wire(&cached.version, &cached.items, &options.locale));
        }
    }

    log::info!("Downloading item list (version {})", version);
    let items = source.items().context("Failed to download item list")?;
    let cached = CachedItems::new(version, options.locale.as_str(), items);
    save_quietly(options, &cached);

    let catalog = Catalog::from_wire(&cached.version, &cached.items, &options.locale);
    log::info!("Catalog has {} relic rewards", catalog.len());
    Ok(catalog)
}

fn save_quietly(options: &CatalogOptions, cached: &CachedItems) {
    if let Err(e) = cache::save(&options.cache_path, cached) {
        log::warn!("Failed to update item cache: {:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    use anyhow::anyhow;

    use super::item::WfmItemI18n;

    struct FakeSource {
        version: Option<String>,
        items: Vec<WfmItem>,
        item_calls: Cell<usize>,
    }

    impl FakeSource {
        fn new(version: Option<&str>, names: &[&str]) -> Self {
            Self {
                version: version.map(str::to_string),
                items: names.iter().map(|name| prime_part(name)).collect(),
                item_calls: Cell::new(0),
            }
        }
    }

    impl ItemSource for FakeSource {
        fn items_version(&self) -> Result<String> {
            self.version.clone().ok_or_else(|| anyhow!("offline"))
        }

        fn items(&self) -> Result<Vec<WfmItem>> {
            self.item_calls.set(self.item_calls.get() + 1);
            Ok(self.items.clone())
        }
    }

    fn prime_part(name: &str) -> WfmItem {
        let mut i18n = HashMap::new();
        i18n.insert(
            "en".to_string(),
            WfmItemI18n {
                name: name.to_string(),
                thumb: None,
            },
        );
        WfmItem {
            id: name.to_string(),
            slug: name.to_lowercase().replace(' ', "_"),
            tags: ["prime", "warframe", "blueprint"].iter().map(|t| t.to_string()).collect(),
            i18n,
            ..Default::default()
        }
    }

    fn options(dir: &tempfile::TempDir) -> CatalogOptions {
        CatalogOptions {
            cache_path: dir.path().join("items.json"),
            locale: "en".to_string(),
            ttl: Duration::hours(24),
            refresh: false,
        }
    }

    fn names(catalog: &Catalog) -> Vec<&str> {
        catalog.items.iter().map(|item| item.name.as_str()).collect()
    }

    #[test]
    fn test_downloads_and_caches_when_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(Some("v1"), &["Ash Prime Blueprint"]);

        let catalog = load_catalog(&source, &options(&dir)).unwrap();

        assert_eq!(names(&catalog), vec!["Ash Prime Blueprint", "Forma Blueprint"]);
        assert_eq!(catalog.version, "v1");
        assert_eq!(source.item_calls.get(), 1);
        assert!(dir.path().join("items.json").exists());
    }

    #[test]
    fn test_fresh_cache_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(&dir);
        cache::save(&opts.cache_path, &CachedItems::new("v1", "en", vec![prime_part("Mag Prime Blueprint")])).unwrap();

        let source = FakeSource::new(None, &[]);
        let catalog = load_catalog(&source, &opts).unwrap();

        assert_eq!(names(&catalog), vec!["Mag Prime Blueprint", "Forma Blueprint"]);
        assert_eq!(source.item_calls.get(), 0);
    }

    #[test]
    fn test_refresh_with_same_version_reuses_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        cache::save(&opts.cache_path, &CachedItems::new("v1", "en", vec![prime_part("Mag Prime Blueprint")])).unwrap();
        opts.refresh = true;

        let source = FakeSource::new(Some("v1"), &["Ash Prime Blueprint"]);
        let catalog = load_catalog(&source, &opts).unwrap();

        assert_eq!(names(&catalog), vec!["Mag Prime Blueprint", "Forma Blueprint"]);
        assert_eq!(source.item_calls.get(), 0);
    }

    #[test]
    fn test_new_version_downloads_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        cache::save(&opts.cache_path, &CachedItems::new("v1", "en", vec![prime_part("Mag Prime Blueprint")])).unwrap();
        opts.refresh = true;

        let source = FakeSource::new(Some("v2"), &["Ash Prime Blueprint"]);
        let catalog = load_catalog(&source, &opts).unwrap();

        assert_eq!(names(&catalog), vec!["Ash Prime Blueprint", "Forma Blueprint"]);
        assert_eq!(catalog.fingerprint(), "v2");
        assert_eq!(cache::load(&opts.cache_path).unwrap().unwrap().version, "v2");
    }

    #[test]
    fn test_offline_falls_back_to_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        cache::save(&opts.cache_path, &CachedItems::new("v1", "en", vec![prime_part("Mag Prime Blueprint")])).unwrap();
        opts.ttl = Duration::zero();

        let source = FakeSource::new(None, &[]);
        let catalog = load_catalog(&source, &opts).unwrap();

        assert_eq!(names(&catalog), vec!["Mag Prime Blueprint", "Forma Blueprint"]);
    }

    #[test]
    fn test_locale_change_downloads_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        cache::save(&opts.cache_path, &CachedItems::new("v1", "en", vec![prime_part("Mag Prime Blueprint")])).unwrap();
        opts.locale = "de".to_string();

        // Fresh cache, same version, but requested in English.
        let source = FakeSource::new(Some("v1"), &["Ash Prime Blueprint"]);
        let catalog = load_catalog(&source, &opts).unwrap();

        assert_eq!(source.item_calls.get(), 1);
        assert_eq!(names(&catalog), vec!["Ash Prime Blueprint", "Forma Blueprint"]);
        assert_eq!(cache::load(&opts.cache_path).unwrap().unwrap().locale, "de");

        // The rewritten cache now serves the new locale without a download.
        let catalog = load_catalog(&source, &opts).unwrap();
        assert_eq!(source.item_calls.get(), 1);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_offline_uses_cache_from_other_locale() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        cache::save(&opts.cache_path, &CachedItems::new("v1", "en", vec![prime_part("Mag Prime Blueprint")])).unwrap();
        opts.locale = "de".to_string();

        let source = FakeSource::new(None, &[]);
        let catalog = load_catalog(&source, &opts).unwrap();
        assert_eq!(names(&catalog), vec!["Mag Prime Blueprint", "Forma Blueprint"]);
    }

    #[test]
    fn test_offline_without_cache_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(None, &[]);
        assert!(load_catalog(&source, &options(&dir)).is_err());
    }

    #[test]
    fn test_fingerprint_without_version_hashes_names() {
        let a = Catalog::new("", vec![CatalogItem::new("1", "a", "Ash Prime Blueprint")]);
        let b = Catalog::new("", vec![CatalogItem::new("2", "b", "Ash Prime Blueprint")]);
        let c = Catalog::new("", vec![CatalogItem::new("1", "a", "Mag Prime Blueprint")]);

        assert!(a.fingerprint().starts_with("names-"));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
