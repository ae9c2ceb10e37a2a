use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const APP_DIR: &str = "relic-scanner";

/// Path of the game log relative to the Steam library root.
const EE_LOG_IN_LIBRARY: &str =
    "steamapps/compatdata/230410/pfx/drive_c/users/steamuser/AppData/Local/Warframe/EE.log";

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Returns the config file path: `<config dir>/relic-scanner/config.json`
pub fn get_config_path() -> PathBuf {
    app_dir(dirs::config_dir()).join("config.json")
}

/// Returns the cache directory: `<cache dir>/relic-scanner/`
pub fn get_cache_dir() -> PathBuf {
    app_dir(dirs::cache_dir())
}

/// Returns the cached item list: `<cache dir>/relic-scanner/items.json`
pub fn get_items_cache_path() -> PathBuf {
    get_cache_dir().join("items.json")
}

/// Returns the data directory: `<local data dir>/relic-scanner/`
pub fn get_data_dir() -> PathBuf {
    app_dir(dirs::data_local_dir())
}

/// Returns the logs directory: `<data dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Returns the downloaded Tesseract data directory: `<data dir>/tessdata/`
pub fn get_tessdata_dir() -> PathBuf {
    get_data_dir().join("tessdata")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_cache_dir())?;
    Ok(())
}

/// Expands a leading `~/` to the home directory.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().context("Cannot expand ~: no home directory")?;
            Ok(home.join(rest))
        }
        None if path == "~" => dirs::home_dir().context("Cannot expand ~: no home directory"),
        None => Ok(PathBuf::from(path)),
    }
}

/// The game log: `log_file` when given, else its location inside the Steam
/// library's Proton prefix.
pub fn resolve_ee_log(log_file: Option<&str>, steam_library: &str) -> Result<PathBuf> {
    match log_file.filter(|f| !f.is_empty()) {
        Some(file) => expand_path(file),
        None => Ok(expand_path(steam_library)?.join(Path::new(EE_LOG_IN_LIBRARY))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/EE.log").unwrap(), home.join("EE.log"));
        assert_eq!(expand_path("~").unwrap(), home);
        assert_eq!(expand_path("/tmp/EE.log").unwrap(), PathBuf::from("/tmp/EE.log"));
        assert_eq!(expand_path("rel/~/x").unwrap(), PathBuf::from("rel/~/x"));
    }

    #[test]
    fn test_resolve_ee_log_explicit() {
        let path = resolve_ee_log(Some("/games/EE.log"), "~/.local/share/Steam").unwrap();
        assert_eq!(path, PathBuf::from("/games/EE.log"));
    }

    #[test]
    fn test_resolve_ee_log_from_library() {
        let path = resolve_ee_log(None, "/mnt/steam").unwrap();
        assert_eq!(
            path,
            PathBuf::from(
                "/mnt/steam/steamapps/compatdata/230410/pfx/drive_c/users/steamuser/AppData/Local/Warframe/EE.log"
            )
        );

        let path = resolve_ee_log(Some(""), "/mnt/steam").unwrap();
        assert!(path.ends_with("Warframe/EE.log"));
    }

    #[test]
    fn test_app_dirs_are_namespaced() {
        assert!(get_items_cache_path().ends_with("relic-scanner/items.json"));
        assert!(get_logs_dir().ends_with("relic-scanner/logs"));
    }
}
