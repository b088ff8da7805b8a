// PDF extraction: rasterization, OCR and content routing
pub mod content_router;
pub mod ocr_engine;
pub mod rasterizer;

pub use content_router::{AnalyzedDocument, CancellationFlag, ContentRouter};
pub use ocr_engine::{OcrEngine, TesseractOcr};
pub use rasterizer::{page_count, PageRasterizer, PdftoppmRasterizer};
