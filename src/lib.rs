//! paperlens: layout-aware extraction and LLM summaries for scientific-paper PDFs.
//!
//! Pages are rasterized, segmented by a layout model into Title/Text/Table/
//! Figure regions, put into two-column reading order, cropped, and routed to
//! OCR or image capture. The extracted text feeds five summary facets whose
//! results are persisted per document under a resources root.
pub mod config;
pub mod layout;
pub mod pdf_extraction;
pub mod pipeline;
pub mod storage;
pub mod summarize;
pub mod types;

pub use config::Config;
pub use pipeline::{Pipeline, ProcessedDocument};
pub use types::{PaperError, Result};
