//! Screen capture sources.
//!
//! - [`CommandCapture`] runs an external screenshot tool (ImageMagick
//!   `import`, `grim`, `scrot`, ...) that writes a PNG
//! - [`FileCapture`] reads an existing image, for offline scans

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use image::RgbaImage;
use tempfile::NamedTempFile;

/// Placeholder in a capture command for the file the tool should write.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Something that produces a picture of the game screen.
pub trait ScreenSource: Send + Sync {
    fn capture(&self) -> Result<RgbaImage>;
}

/// Captures by running an external command.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    /// `command` is the program followed by its arguments. At least one
    /// argument must contain [`OUTPUT_PLACEHOLDER`].
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Capture command is empty"))?;
        if !args.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            bail!(
                "Capture command must contain {} for the output file",
                OUTPUT_PLACEHOLDER
            );
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn args_for(&self, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, output))
            .collect()
    }
}

impl ScreenSource for CommandCapture {
    fn capture(&self) -> Result<RgbaImage> {
        let output = NamedTempFile::with_suffix(".png")?;
        let output_path = output.path().to_string_lossy().to_string();

        log::debug!("Capturing with {} {:?}", self.program, self.args_for(&output_path));
        let result = Command::new(&self.program)
            .args(self.args_for(&output_path))
            .output()
            .with_context(|| format!("Failed to run capture command {}", self.program))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!("Capture command failed: {}", stderr.trim());
        }

        let img = image::open(output.path())
            .context("Failed to read captured screenshot")?
            .to_rgba8();
        log::debug!("Captured {}x{}", img.width(), img.height());
        Ok(img)
    }
}

/// Reads a fixed image file.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScreenSource for FileCapture {
    fn capture(&self) -> Result<RgbaImage> {
        Ok(image::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?
            .to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_requires_placeholder() {
        assert!(CommandCapture::new(&[]).is_err());
        assert!(CommandCapture::new(&command(&["grim"])).is_err());
        assert!(CommandCapture::new(&command(&["grim", "{output}"])).is_ok());
    }

    #[test]
    fn test_command_substitutes_output() {
        let capture = CommandCapture::new(&command(&["import", "-window", "root", "png:{output}"])).unwrap();
        assert_eq!(
            capture.args_for("/tmp/x.png"),
            vec!["-window", "root", "png:/tmp/x.png"]
        );
    }

    #[test]
    fn test_command_capture_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("screen.png");
        RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])).save(&source).unwrap();

        let capture = CommandCapture::new(&command(&["cp", source.to_str().unwrap(), "{output}"])).unwrap();
        let img = capture.capture().unwrap();

        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_command_capture_failure() {
        let capture = CommandCapture::new(&command(&["false", "{output}"])).unwrap();
        assert!(capture.capture().is_err());
    }

    #[test]
    fn test_file_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.png");
        RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])).save(&path).unwrap();

        assert_eq!(FileCapture::new(&path).capture().unwrap().dimensions(), (2, 2));
        assert!(FileCapture::new(dir.path().join("missing.png")).capture().is_err());
    }
}
