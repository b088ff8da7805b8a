// Routes ordered regions to OCR or image capture and aggregates the document
use crate::layout::{build_page_layout, crop, RegionDetector};
use crate::pdf_extraction::ocr_engine::OcrEngine;
use crate::pdf_extraction::rasterizer::PageRasterizer;
use crate::types::{
    DocumentExtraction, DocumentLayout, ExtractionDiagnostics, PaperError, Page, Region, RegionKind, Result,
};
use image::RgbImage;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared abort switch, checked at page boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PaperError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Rasterized pages plus their ordered layout.
pub struct AnalyzedDocument {
    pub pages: Vec<Arc<Page>>,
    pub layout: DocumentLayout,
}

pub struct ContentRouter {
    rasterizer: Arc<dyn PageRasterizer>,
    detector: Arc<dyn RegionDetector>,
    ocr: Arc<dyn OcrEngine>,
    cancel: CancellationFlag,
}

impl ContentRouter {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        detector: Arc<dyn RegionDetector>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            rasterizer,
            detector,
            ocr,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Rasterize and lay out every page. Any detection failure aborts the run.
    pub async fn analyze_layout(&self, pdf_path: &Path) -> Result<AnalyzedDocument> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let path = pdf_path.to_path_buf();
        let pages: Vec<Arc<Page>> = tokio::task::spawn_blocking(move || rasterizer.rasterize(&path))
            .await
            .map_err(|e| PaperError::Rasterize(e.to_string()))??
            .into_iter()
            .map(Arc::new)
            .collect();

        let mut layout = DocumentLayout::new();
        for page in &pages {
            self.cancel.check()?;
            let start = Instant::now();
            let detector = Arc::clone(&self.detector);
            let target = Arc::clone(page);
            let detections = tokio::task::spawn_blocking(move || detector.detect(&target))
                .await
                .map_err(|e| PaperError::DetectionUnavailable(e.to_string()))??;

            let page_layout = build_page_layout(page.index, page.width(), page.height(), detections);
            debug!(
                "page {}: {} regions in {:?}",
                page.index,
                page_layout.region_count(),
                start.elapsed()
            );
            layout.insert(page.index, page_layout);
        }

        Ok(AnalyzedDocument { pages, layout })
    }

    /// Title, body text, tables and figures of one PDF.
    pub async fn extract_document(&self, pdf_path: &Path) -> Result<DocumentExtraction> {
        let AnalyzedDocument { pages, layout } = self.analyze_layout(pdf_path).await?;
        let by_index: BTreeMap<usize, Arc<Page>> = pages.iter().map(|p| (p.index, Arc::clone(p))).collect();

        let mut diagnostics = ExtractionDiagnostics {
            pages: pages.len(),
            regions_detected: layout.values().map(|l| l.region_count()).sum(),
            ocr_failures: 0,
        };
        info!(
            "📄 {} pages, {} regions detected",
            diagnostics.pages, diagnostics.regions_detected
        );

        let title = self.extract_title(&layout, &by_index).await?;
        info!("🏷️  Title: {}", title);

        let full_text = self.extract_text(&layout, &by_index, &mut diagnostics).await?;
        let tables = capture_images(&layout, &by_index, RegionKind::Table);
        let figures = capture_images(&layout, &by_index, RegionKind::Figure);

        if diagnostics.ocr_failures > 0 {
            warn!("⚠️ {} text blocks failed OCR and were skipped", diagnostics.ocr_failures);
        }
        info!(
            "✅ Extracted {} words, {} tables, {} figures",
            full_text.split_whitespace().count(),
            tables.values().map(Vec::len).sum::<usize>(),
            figures.values().map(Vec::len).sum::<usize>()
        );

        Ok(DocumentExtraction {
            title,
            full_text,
            tables,
            figures,
            diagnostics,
        })
    }

    async fn extract_title(&self, layout: &DocumentLayout, pages: &BTreeMap<usize, Arc<Page>>) -> Result<String> {
        let region = select_title_region(layout)
            .ok_or_else(|| PaperError::TitleNotFound("no title region on any page".to_string()))?;
        let page = pages
            .get(&region.page)
            .ok_or_else(|| PaperError::TitleNotFound(format!("page {} was not rasterized", region.page)))?;
        match self.recognize(region, page).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => {
                warn!("title OCR failed on page {}: {}", region.page, e);
                Err(PaperError::TitleNotFound(format!(
                    "title region found on page {} but OCR failed: {}",
                    region.page, e
                )))
            }
        }
    }

    async fn extract_text(
        &self,
        layout: &DocumentLayout,
        pages: &BTreeMap<usize, Arc<Page>>,
        diagnostics: &mut ExtractionDiagnostics,
    ) -> Result<String> {
        let mut blocks: Vec<String> = Vec::new();
        for (index, page_layout) in layout {
            self.cancel.check()?;
            let Some(page) = pages.get(index) else {
                continue;
            };
            for region in page_layout.of_kind(RegionKind::Text) {
                match self.recognize(region, page).await {
                    Ok(text) => blocks.push(text),
                    Err(e) => {
                        warn!("OCR failed on page {} block {:?}: {}", index, region.order, e);
                        diagnostics.ocr_failures += 1;
                    }
                }
            }
        }
        Ok(join_blocks(&blocks))
    }

    async fn recognize(&self, region: &Region, page: &Page) -> Result<String> {
        let segment = crop(region, page);
        let ocr = Arc::clone(&self.ocr);
        tokio::task::spawn_blocking(move || ocr.recognize(&segment.image))
            .await
            .map_err(|e| PaperError::OcrBlockFailed(e.to_string()))
            .and_then(|r| r)
    }
}

/// First ordered Title region of the earliest page that has one.
pub fn select_title_region(layout: &DocumentLayout) -> Option<&Region> {
    layout
        .values()
        .find_map(|page| page.of_kind(RegionKind::Title).first())
}

/// Trim each block, drop empty ones, join with a single space.
pub fn join_blocks(blocks: &[String]) -> String {
    blocks
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Crop every ordered region of `kind`, keyed by page; pages without any are absent.
pub fn capture_images(
    layout: &DocumentLayout,
    pages: &BTreeMap<usize, Arc<Page>>,
    kind: RegionKind,
) -> BTreeMap<usize, Vec<RgbImage>> {
    let mut captured = BTreeMap::new();
    for (index, page_layout) in layout {
        let regions = page_layout.of_kind(kind);
        let Some(page) = pages.get(index) else {
            continue;
        };
        if regions.is_empty() {
            continue;
        }
        let images: Vec<RgbImage> = regions.iter().map(|r| crop(r, page).image).collect();
        captured.insert(*index, images);
    }
    captured
}
