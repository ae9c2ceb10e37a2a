use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use tempfile::NamedTempFile;

/// Characters Tesseract may emit. Item names are plain Latin words.
pub const NAME_WHITELIST: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ ";

/// Represents a line of OCR text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
    pub confidence: f32,
}

/// Represents a single word from OCR with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

/// Text recognition on a binarized (black text on white) image.
pub trait OcrEngine: Send + Sync {
    /// Recognized words grouped by text line, top to bottom.
    fn recognize_lines(&self, img: &GrayImage) -> Result<Vec<OcrLine>>;

    /// The whole image as one string.
    fn recognize_text(&self, img: &GrayImage) -> Result<String>;
}

/// Runs the `tesseract` executable on a temporary PNG.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
    pub language: String,
    /// Tesseract page segmentation mode. 6 = single uniform block of text.
    pub psm: u8,
    pub whitelist: Option<String>,
}

impl TesseractCli {
    pub fn new(executable: PathBuf, tessdata: PathBuf) -> Self {
        Self {
            executable,
            tessdata,
            language: "eng".to_string(),
            psm: 6,
            whitelist: Some(NAME_WHITELIST.to_string()),
        }
    }

    fn command(&self, input: &NamedTempFile, output: &str) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg(input.path())
            .arg(output)
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string());
        if let Some(whitelist) = &self.whitelist {
            command
                .arg("-c")
                .arg(format!("tessedit_char_whitelist={}", whitelist));
        }
        command
    }

    fn run(&self, img: &GrayImage, output: &str, extra: Option<&str>) -> Result<Vec<u8>> {
        let input = NamedTempFile::with_suffix(".png")?;
        img.save(input.path())
            .context("Failed to write OCR input image")?;

        let mut command = self.command(&input, output);
        if let Some(extra) = extra {
            command.arg(extra);
        }

        let result = command
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }
        Ok(result.stdout)
    }
}

impl OcrEngine for TesseractCli {
    fn recognize_lines(&self, img: &GrayImage) -> Result<Vec<OcrLine>> {
        // Tesseract appends .tsv to the output base name.
        let output = NamedTempFile::new()?;
        let output_base = output.path().to_string_lossy().to_string();
        self.run(img, &output_base, Some("tsv"))?;

        let tsv_path = format!("{}.tsv", output_base);
        let tsv = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_output(&tsv))
    }

    fn recognize_text(&self, img: &GrayImage) -> Result<String> {
        let stdout = self.run(img, "stdout", None)?;
        Ok(String::from_utf8_lossy(&stdout).to_string())
    }
}

/// Groups Tesseract TSV word rows into lines.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Level 5 rows are words; a change of
/// (block, paragraph, line) starts a new line. Words with negative confidence
/// or empty text are dropped.
pub fn parse_tsv_output(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut words: Vec<OcrWord> = Vec::new();

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 || fields[0].trim() != "5" {
            continue;
        }

        let number = |i: usize| fields[i].trim().parse::<i32>().unwrap_or(-1);
        let key = (number(2), number(3), number(4));
        let confidence: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        if text.is_empty() || confidence < 0.0 {
            continue;
        }

        if current_key.is_some_and(|k| k != key) {
            lines.extend(finish_line(std::mem::take(&mut words)));
        }
        current_key = Some(key);
        words.push(OcrWord {
            text: text.to_string(),
            confidence,
        });
    }
    lines.extend(finish_line(words));

    lines
}

fn finish_line(words: Vec<OcrWord>) -> Option<OcrLine> {
    if words.is_empty() {
        return None;
    }
    let confidence = words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32;
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(OcrLine {
        text,
        words,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: i32, line: i32, n: i32, conf: f32, text: &str) -> String {
        format!("5\t1\t{}\t1\t{}\t{}\t0\t0\t10\t10\t{}\t{}", block, line, n, conf, text)
    }

    #[test]
    fn test_parse_tsv_groups_lines() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t965\t50\t-1\t".to_string(),
            "4\t1\t1\t1\t1\t0\t0\t0\t965\t25\t-1\t".to_string(),
            word(1, 1, 1, 96.0, "Ash"),
            word(1, 1, 2, 90.0, "Prime"),
            word(1, 2, 1, 80.0, "Blueprint"),
        ]
        .join("\n");

        let lines = parse_tsv_output(&tsv);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Ash Prime");
        assert_eq!(lines[0].confidence, 93.0);
        assert_eq!(lines[1].text, "Blueprint");
        assert_eq!(lines[1].words.len(), 1);
    }

    #[test]
    fn test_parse_tsv_same_line_number_in_new_block() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 1, 90.0, "Forma"),
            word(2, 1, 1, 90.0, "Blueprint"),
        ]
        .join("\n");

        let lines = parse_tsv_output(&tsv);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_parse_tsv_skips_empty_and_unconfident_words() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 1, -1.0, "ghost"),
            word(1, 1, 2, 50.0, " "),
            word(1, 1, 3, 70.0, "Stock"),
            "garbage row".to_string(),
        ]
        .join("\n");

        let lines = parse_tsv_output(&tsv);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Stock");
    }

    #[test]
    fn test_parse_tsv_empty() {
        assert!(parse_tsv_output("").is_empty());
        assert!(parse_tsv_output(HEADER).is_empty());
    }
}
