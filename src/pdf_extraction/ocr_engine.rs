// OCR adapter: cropped region image → text (Tesseract CLI)
use crate::config::OcrConfig;
use crate::types::{PaperError, Result};
use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Capability: recognize the text in one cropped region.
///
/// Failures are reported as [`PaperError::OcrBlockFailed`]; callers decide
/// whether that is fatal.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> Result<String>;
}

pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_binary.clone(),
            language: config.language.clone(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &RgbImage) -> Result<String> {
        let block_failed = |e: &dyn std::fmt::Display| PaperError::OcrBlockFailed(e.to_string());

        // temp file lives only for the duration of this call
        let temp = tempfile::Builder::new()
            .prefix("paperlens_ocr_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| block_failed(&e))?;
        image
            .save_with_format(temp.path(), ImageFormat::Png)
            .map_err(|e| block_failed(&e))?;

        let output = Command::new(&self.binary)
            .arg(temp.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .map_err(|e| block_failed(&format!("cannot run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(block_failed(&format!("{} exited with {}: {}", self.binary, output.status, stderr.trim())));
        }

        Ok(normalize_ocr_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Collapse whitespace runs (line breaks included) to single spaces and trim.
pub fn normalize_ocr_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_line_breaks() {
        assert_eq!(
            normalize_ocr_text("  Deep   Residual\nLearning for\n\nImage Recognition \u{c}"),
            "Deep Residual Learning for Image Recognition"
        );
        assert_eq!(normalize_ocr_text(" \n\t "), "");
    }

    #[test]
    fn missing_binary_is_block_failure() {
        let ocr = TesseractOcr::new(&OcrConfig {
            tesseract_binary: "/nonexistent/tesseract".to_string(),
            language: "eng".to_string(),
        });
        let image = RgbImage::new(8, 8);
        assert!(matches!(ocr.recognize(&image), Err(PaperError::OcrBlockFailed(_))));
    }
}
