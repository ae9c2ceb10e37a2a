use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::paths;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

const SYSTEM_EXECUTABLES: &[&str] = &["/usr/bin/tesseract", "/usr/local/bin/tesseract"];

const SYSTEM_TESSDATA: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Locates Tesseract and the trained data for `language`, downloading the
/// trained data into the local data directory when no copy is found.
///
/// Explicit paths take precedence over any lookup.
pub fn ensure_tesseract(
    executable: Option<&Path>,
    tessdata: Option<&Path>,
    language: &str,
) -> Result<TesseractPaths> {
    let executable = match executable {
        Some(path) => path.to_path_buf(),
        None => find_tesseract_executable()?,
    };

    let tessdata = match tessdata {
        Some(path) => path.to_path_buf(),
        None => match find_tessdata_dir(language) {
            Some(dir) => dir,
            None => {
                let dir = paths::get_tessdata_dir();
                download_tessdata(&dir, language)?;
                dir
            }
        },
    };

    log::info!(
        "Tesseract: {} (data: {})",
        executable.display(),
        tessdata.display()
    );
    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable on PATH or in the usual install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    SYSTEM_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .ok_or_else(|| {
            anyhow!("Tesseract not found. Install it with your package manager (e.g. tesseract-ocr).")
        })
}

/// Finds a directory containing `<language>.traineddata`.
///
/// Checks our data directory, then `TESSDATA_PREFIX` (with and without a
/// `tessdata` subdirectory), then the distribution paths.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let file = traineddata_file(language);

    let mut candidates = vec![paths::get_tessdata_dir()];
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }
    candidates.extend(SYSTEM_TESSDATA.iter().map(PathBuf::from));

    candidates.into_iter().find(|dir| dir.join(&file).exists())
}

fn traineddata_file(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// Downloads `<language>.traineddata` into `dir`.
fn download_tessdata(dir: &Path, language: &str) -> Result<()> {
    let file = traineddata_file(language);
    let url = format!("{}/{}", TESSDATA_REPO, file);
    let target = dir.join(&file);

    log::info!("Downloading {}...", file);
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "relic-scanner")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    // Write under a temporary name so an interrupted download is not picked up.
    let partial = dir.join(format!("{}.part", file));
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, &target)?;

    log::info!("Downloaded {} ({} bytes)", file, bytes.len());
    Ok(())
}
