// Layout segmentation: detection, reading order and cropping
pub mod crop;
pub mod detector;
pub mod reading_order;
pub mod yolo;

pub use crop::{crop, padded_rect, CroppedSegment, PixelRect};
pub use detector::{OnnxLayoutDetector, RegionDetector};
pub use reading_order::{build_page_layout, column_of, resolve, Column};
