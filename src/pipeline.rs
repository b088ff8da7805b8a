// End-to-end document pipeline: extract → summarize → persist
use crate::config::Config;
use crate::layout::{OnnxLayoutDetector, RegionDetector};
use crate::pdf_extraction::{CancellationFlag, ContentRouter, OcrEngine, PageRasterizer, PdftoppmRasterizer, TesseractOcr};
use crate::storage::{ResourceStore, SummaryRecord};
use crate::summarize::{Facet, LlmClient, OpenAiCompletionClient, RetryPolicy, SummarizationOrchestrator};
use crate::types::{ExtractionDiagnostics, PaperError, Result};
use log::info;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub record: SummaryRecord,
    pub diagnostics: ExtractionDiagnostics,
    pub failed_facets: Vec<String>,
}

pub struct Pipeline {
    router: ContentRouter,
    orchestrator: SummarizationOrchestrator,
    store: ResourceStore,
}

impl Pipeline {
    pub fn new(router: ContentRouter, orchestrator: SummarizationOrchestrator, store: ResourceStore) -> Self {
        Self {
            router,
            orchestrator,
            store,
        }
    }

    /// Production capabilities: pdftoppm, ONNX layout model, Tesseract, OpenAI-compatible LLM.
    pub fn from_config(config: &Config) -> Result<Self> {
        let rasterizer: Arc<dyn PageRasterizer> = Arc::new(PdftoppmRasterizer::new(&config.raster));
        let detector: Arc<dyn RegionDetector> = Arc::new(OnnxLayoutDetector::new(&config.layout));
        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractOcr::new(&config.ocr));
        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiCompletionClient::new(&config.llm)?);

        Ok(Self::new(
            ContentRouter::new(rasterizer, detector, ocr),
            SummarizationOrchestrator::new(llm, RetryPolicy::from_config(&config.llm)),
            ResourceStore::new(&config.resources_root),
        ))
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.router = self.router.with_cancellation(cancel);
        self
    }

    pub fn router(&self) -> &ContentRouter {
        &self.router
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Fatal errors surface before anything is written for the document.
    pub async fn process(&self, pdf_path: &Path) -> Result<ProcessedDocument> {
        let start = Instant::now();
        let document_id = ResourceStore::document_id(pdf_path)?;
        info!("🚀 Processing {} as '{}'", pdf_path.display(), document_id);

        let extraction = self.router.extract_document(pdf_path).await?;
        let outcome = self.orchestrator.summarize(&extraction.full_text).await;
        // last chance to abort before the first artifact is written
        if self.router.cancellation().is_cancelled() {
            return Err(PaperError::Cancelled);
        }

        let record = self.store.persist(&document_id, &extraction, &outcome.facets)?;
        info!("🏁 '{}' done in {:?}", document_id, start.elapsed());

        Ok(ProcessedDocument {
            document_id,
            record,
            diagnostics: extraction.diagnostics,
            failed_facets: outcome.failed.iter().map(Facet::name).map(str::to_string).collect(),
        })
    }

    pub fn retrieve(&self, document_id: &str) -> Result<SummaryRecord> {
        self.store.retrieve(document_id)
    }
}
