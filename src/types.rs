// Core types and error taxonomy for paperlens
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One rasterized PDF page (RGB, page pixel coordinates).
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub image: RgbImage,
}

impl Page {
    pub fn new(index: usize, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Layout labels produced by the PubLayNet-style detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Text,
    Title,
    List,
    Table,
    Figure,
}

impl RegionKind {
    pub const ALL: [RegionKind; 5] = [
        RegionKind::Text,
        RegionKind::Title,
        RegionKind::List,
        RegionKind::Table,
        RegionKind::Figure,
    ];

    /// Fixed label map: 0 Text, 1 Title, 2 List, 3 Table, 4 Figure.
    pub fn from_label(label: usize) -> Option<Self> {
        Self::ALL.get(label).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Text => "Text",
            RegionKind::Title => "Title",
            RegionKind::List => "List",
            RegionKind::Table => "Table",
            RegionKind::Figure => "Figure",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BBox) -> f32 {
        let ix0 = self.x0.max(other.x0);
        let iy0 = self.y0.max(other.y0);
        let ix1 = self.x1.min(other.x1);
        let iy1 = self.y1.min(other.y1);
        let inter = (ix1 - ix0).max(0.0) * (iy1 - iy0).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// A detected layout element on a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub page: usize,
    pub kind: RegionKind,
    pub bbox: BBox,
    pub score: f32,
    /// Reading-order index within (page, kind); set by the resolver.
    pub order: Option<usize>,
}

impl Region {
    pub fn new(page: usize, kind: RegionKind, bbox: BBox, score: f32) -> Self {
        Self {
            page,
            kind,
            bbox,
            score,
            order: None,
        }
    }
}

/// Ordered regions of one page, one independently-resolved list per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub page: usize,
    pub width: u32,
    pub height: u32,
    pub regions: BTreeMap<RegionKind, Vec<Region>>,
}

impl PageLayout {
    pub fn of_kind(&self, kind: RegionKind) -> &[Region] {
        self.regions.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn region_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

/// Page index → ordered page layout, built once per document.
pub type DocumentLayout = BTreeMap<usize, PageLayout>;

/// Counters surfaced for diagnostics; never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionDiagnostics {
    pub pages: usize,
    pub regions_detected: usize,
    pub ocr_failures: usize,
}

/// Everything the content router pulls out of one PDF.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtraction {
    pub title: String,
    pub full_text: String,
    pub tables: BTreeMap<usize, Vec<RgbImage>>,
    pub figures: BTreeMap<usize, Vec<RgbImage>>,
    pub diagnostics: ExtractionDiagnostics,
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum PaperError {
    #[error("layout detection unavailable: {0}")]
    DetectionUnavailable(String),

    #[error("title not found: {0}")]
    TitleNotFound(String),

    #[error("OCR failed on block: {0}")]
    OcrBlockFailed(String),

    #[error("summary facet '{facet}' failed: {reason}")]
    SummaryFacetFailed { facet: String, reason: String },

    #[error("document not processed: {0}")]
    DocumentNotProcessed(String),

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),

    #[error("processing cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PaperError>;
