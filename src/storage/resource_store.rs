// Per-document resource directory: title.txt, images, info.json
use crate::storage::image_ref::{validate_component, ImageRef};
use crate::summarize::SummaryFacets;
use crate::types::{DocumentExtraction, PaperError, Result};
use image::RgbImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const INFO_FILE: &str = "info.json";
pub const TITLE_FILE: &str = "title.txt";

/// Scratch siblings of a document directory; hidden so they never list as documents.
const STAGING_PREFIX: &str = ".staging-";
const REPLACED_PREFIX: &str = ".replaced-";

/// The persisted `info.json` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub title: String,
    pub authors: String,
    pub summary: String,
    pub key_concepts: String,
    pub highlights: String,
    pub limitations: String,
    #[serde(default)]
    pub figures: Vec<String>,
    #[serde(default)]
    pub tables: Vec<String>,
}

impl SummaryRecord {
    pub fn new(title: &str, facets: &SummaryFacets) -> Self {
        Self {
            title: title.to_string(),
            authors: facets.authors.clone(),
            summary: facets.summary.clone(),
            key_concepts: facets.keywords.clone(),
            highlights: facets.key_results.clone(),
            limitations: facets.limitations.clone(),
            figures: Vec::new(),
            tables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Table,
    Figure,
}

impl ImageKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ImageKind::Table => "_table.png",
            ImageKind::Figure => "_fig.png",
        }
    }

    pub fn of_file_name(name: &str) -> Option<Self> {
        [ImageKind::Table, ImageKind::Figure]
            .into_iter()
            .find(|kind| name.ends_with(kind.suffix()))
    }
}

/// `{page}{index}{suffix}`; the rare ambiguous name (page 1 index 10 vs page
/// 11 index 0) falls back to `{page}-{index}{suffix}`.
pub fn image_file_name(page: usize, index: usize, kind: ImageKind, taken: &mut HashSet<String>) -> String {
    let plain = format!("{}{}{}", page, index, kind.suffix());
    let name = if taken.contains(&plain) {
        format!("{}-{}{}", page, index, kind.suffix())
    } else {
        plain
    };
    taken.insert(name.clone());
    name
}

pub struct ResourceStore {
    root: PathBuf,
}

impl ResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document id is the PDF file stem.
    pub fn document_id(pdf_path: &Path) -> Result<String> {
        let stem = pdf_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PaperError::InvalidDocumentId(pdf_path.display().to_string()))?;
        validate_document_id(stem)?;
        Ok(stem.to_string())
    }

    pub fn document_dir(&self, doc_id: &str) -> Result<PathBuf> {
        validate_document_id(doc_id)?;
        Ok(self.root.join(doc_id))
    }

    /// Write every artifact of one document into a staging directory, then
    /// swap it in. A failed run leaves the previous record untouched.
    pub fn persist(&self, doc_id: &str, extraction: &DocumentExtraction, facets: &SummaryFacets) -> Result<SummaryRecord> {
        let dir = self.document_dir(doc_id)?;
        let staging = self.root.join(format!("{}{}", STAGING_PREFIX, doc_id));
        fs::create_dir_all(&self.root)?;
        if staging.is_dir() {
            debug!("removing abandoned staging dir {}", staging.display());
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir(&staging)?;

        let record = match write_artifacts(&staging, doc_id, extraction, facets) {
            Ok(record) => record,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };
        swap_in(&staging, &dir, &self.root.join(format!("{}{}", REPLACED_PREFIX, doc_id)))?;

        info!(
            "💾 Saved {} ({} tables, {} figures) to {}",
            doc_id,
            record.tables.len(),
            record.figures.len(),
            dir.display()
        );
        Ok(record)
    }

    /// Load a finished record; anything without `info.json` was never completed.
    /// Image lists reflect the files currently in the directory.
    pub fn retrieve(&self, doc_id: &str) -> Result<SummaryRecord> {
        let dir = self.document_dir(doc_id)?;
        let info_path = dir.join(INFO_FILE);
        if !info_path.is_file() {
            return Err(PaperError::DocumentNotProcessed(doc_id.to_string()));
        }

        let mut record: SummaryRecord = serde_json::from_str(&fs::read_to_string(&info_path)?)?;
        let title_path = dir.join(TITLE_FILE);
        if title_path.is_file() {
            record.title = fs::read_to_string(title_path)?;
        }
        record.tables = images_on_disk(&dir, doc_id, ImageKind::Table)?;
        record.figures = images_on_disk(&dir, doc_id, ImageKind::Figure)?;
        Ok(record)
    }

    /// Client-facing reference → table or figure file on disk.
    pub fn resolve_image(&self, reference: &str) -> Result<PathBuf> {
        let image_ref = ImageRef::parse(reference)?;
        if ImageKind::of_file_name(&image_ref.file_name).is_none() {
            return Err(PaperError::DocumentNotProcessed(reference.to_string()));
        }
        let path = self.document_dir(&image_ref.document_id)?.join(&image_ref.file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PaperError::DocumentNotProcessed(reference.to_string()))
        }
    }

    pub fn list_documents(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with('.') && entry.path().join(INFO_FILE).is_file() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Hidden names are reserved for staging directories.
fn validate_document_id(doc_id: &str) -> Result<()> {
    validate_component(doc_id)?;
    if doc_id.starts_with('.') {
        return Err(PaperError::InvalidDocumentId(doc_id.to_string()));
    }
    Ok(())
}

/// title.txt, images, then info.json as the completion marker.
fn write_artifacts(
    dir: &Path,
    doc_id: &str,
    extraction: &DocumentExtraction,
    facets: &SummaryFacets,
) -> Result<SummaryRecord> {
    fs::write(dir.join(TITLE_FILE), &extraction.title)?;

    let mut record = SummaryRecord::new(&extraction.title, facets);
    record.tables = write_images(dir, doc_id, &extraction.tables, ImageKind::Table)?;
    record.figures = write_images(dir, doc_id, &extraction.figures, ImageKind::Figure)?;

    fs::write(dir.join(INFO_FILE), serde_json::to_string_pretty(&record)?)?;
    Ok(record)
}

/// Replace `dir` with `staging`; the old directory is restored if the swap fails.
fn swap_in(staging: &Path, dir: &Path, replaced: &Path) -> Result<()> {
    if replaced.exists() {
        fs::remove_dir_all(replaced)?;
    }
    let had_previous = dir.exists();
    if had_previous {
        fs::rename(dir, replaced)?;
    }
    if let Err(e) = fs::rename(staging, dir) {
        if had_previous {
            let _ = fs::rename(replaced, dir);
        }
        return Err(e.into());
    }
    if had_previous {
        if let Err(e) = fs::remove_dir_all(replaced) {
            warn!("could not remove previous run at {}: {}", replaced.display(), e);
        }
    }
    Ok(())
}

/// References to every image of `kind` in `dir`, sorted by file name.
fn images_on_disk(dir: &Path, doc_id: &str, kind: ImageKind) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && ImageKind::of_file_name(name) == Some(kind) {
            names.push(name.to_string());
        }
    }
    names.sort();
    names
        .iter()
        .map(|name| ImageRef::new(doc_id, name).map(|r| r.to_string()))
        .collect()
}

fn write_images(
    dir: &Path,
    doc_id: &str,
    images: &BTreeMap<usize, Vec<RgbImage>>,
    kind: ImageKind,
) -> Result<Vec<String>> {
    let mut taken = HashSet::new();
    let mut references = Vec::new();
    for (page, page_images) in images {
        for (index, image) in page_images.iter().enumerate() {
            let name = image_file_name(*page, index, kind, &mut taken);
            image.save(dir.join(&name))?;
            references.push(ImageRef::new(doc_id, &name)?.to_string());
        }
    }
    Ok(references)
}
