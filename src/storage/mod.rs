// Storage layer: persisted per-document resources
pub mod image_ref;
pub mod resource_store;

pub use image_ref::ImageRef;
pub use resource_store::{ImageKind, ResourceStore, SummaryRecord, INFO_FILE, TITLE_FILE};
