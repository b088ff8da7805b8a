// PDF → page images using pdftoppm (poppler)
use crate::config::RasterConfig;
use crate::types::{PaperError, Page, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// pdftoppm zero-pads the page number to the width of the page count.
static PAGE_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^page-(\d+)\.png$").expect("static regex"));

/// Capability: every page of a PDF as an RGB image, in PDF page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<Page>>;
}

pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(config: &RasterConfig) -> Self {
        Self {
            binary: config.pdftoppm_binary.clone(),
            dpi: config.dpi,
        }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<Page>> {
        let expected = page_count(pdf_path)?;
        info!("🖨️  Rasterizing {} ({} pages at {} dpi)", pdf_path.display(), expected, self.dpi);

        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");

        let output = Command::new(&self.binary)
            .arg("-png")
            .args(["-r", &self.dpi.to_string()])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| PaperError::Rasterize(format!("cannot run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PaperError::Rasterize(format!("{} failed: {}", self.binary, stderr.trim())));
        }

        let mut pages = Vec::new();
        for (index, path) in page_files(temp_dir.path())?.into_iter().enumerate() {
            debug!("loading rendered page {:?}", path);
            let image = image::open(&path)?.to_rgb8();
            pages.push(Page::new(index, image));
        }

        if pages.len() != expected {
            warn!("pdftoppm produced {} pages, document reports {}", pages.len(), expected);
        }
        if pages.is_empty() {
            return Err(PaperError::Rasterize(format!("no pages rendered from {}", pdf_path.display())));
        }
        Ok(pages)
    }
}

/// Page count straight from the PDF structure.
pub fn page_count(pdf_path: &Path) -> Result<usize> {
    let document = lopdf::Document::load(pdf_path)
        .map_err(|e| PaperError::Rasterize(format!("cannot open {}: {}", pdf_path.display(), e)))?;
    Ok(document.get_pages().len())
}

/// Rendered page files sorted by their numeric page suffix.
fn page_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered: Vec<(usize, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(num) = PAGE_FILE
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        {
            numbered.push((num, path));
        }
    }
    numbered.sort_by_key(|(num, _)| *num);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn page_files_sort_numerically() {
        let dir = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-1.png", "notes.txt", "page-3.jpg"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = page_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn page_count_rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.pdf");
        fs::write(&path, b"not a pdf").unwrap();
        assert!(matches!(page_count(&path), Err(PaperError::Rasterize(_))));
    }
}
