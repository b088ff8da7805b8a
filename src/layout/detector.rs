// Layout detection over rasterized pages (ONNX Runtime)
use crate::config::LayoutConfig;
use crate::layout::yolo::{self, Letterbox};
use crate::types::{PaperError, Page, Region, Result};
use log::{debug, info};
use once_cell::sync::OnceCell;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Capability: page image in, labelled regions out.
///
/// Implementations drop detections at or below their confidence threshold and
/// report an unusable model as [`PaperError::DetectionUnavailable`].
pub trait RegionDetector: Send + Sync {
    fn detect(&self, page: &Page) -> Result<Vec<Region>>;
}

/// PubLayNet-trained YOLO layout model served through `ort`.
pub struct OnnxLayoutDetector {
    model_path: PathBuf,
    input_size: u32,
    score_threshold: f32,
    iou_threshold: f32,
    intra_threads: usize,
    session: OnceCell<Mutex<Session>>,
}

impl OnnxLayoutDetector {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            input_size: config.input_size,
            score_threshold: config.score_threshold,
            iou_threshold: config.iou_threshold,
            intra_threads: config.intra_threads,
            session: OnceCell::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn session(&self) -> Result<&Mutex<Session>> {
        self.session.get_or_try_init(|| {
            if !self.model_path.exists() {
                return Err(PaperError::DetectionUnavailable(format!(
                    "layout model not found at {}",
                    self.model_path.display()
                )));
            }
            info!("📦 Loading layout model from {}", self.model_path.display());
            let session = load_session(&self.model_path, self.intra_threads)
                .map_err(|e| PaperError::DetectionUnavailable(format!("{e:#}")))?;
            info!("✅ Layout model loaded");
            Ok(Mutex::new(session))
        })
    }

    fn infer(&self, tensor: Vec<f32>) -> anyhow::Result<(Vec<i64>, Vec<f32>)> {
        let size = self.input_size as usize;
        let input = Tensor::from_array(([1_usize, 3, size, size], tensor.into_boxed_slice()))?;

        let mut session = self
            .session()?
            .lock()
            .map_err(|_| anyhow::anyhow!("layout session lock poisoned"))?;
        let outputs = session.run(inputs![input])?;
        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        Ok((shape.iter().copied().collect(), data.to_vec()))
    }
}

fn load_session(path: &Path, intra_threads: usize) -> anyhow::Result<Session> {
    let _ = ort::init();
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;
    Ok(session)
}

impl RegionDetector for OnnxLayoutDetector {
    fn detect(&self, page: &Page) -> Result<Vec<Region>> {
        // surface a missing model before spending time on preprocessing
        self.session()?;

        let (tensor, letterbox) = yolo::letterbox_tensor(&page.image, self.input_size);
        let (dims, data) = self
            .infer(tensor)
            .map_err(|e| PaperError::DetectionUnavailable(format!("{e:#}")))?;

        let regions = regions_from_output(&data, &dims, &letterbox, page, self.score_threshold, self.iou_threshold)?;
        debug!("page {}: {} regions above {:.2}", page.index, regions.len(), self.score_threshold);
        Ok(regions)
    }
}

/// Raw head output → page regions in detector emission order (score desc).
pub fn regions_from_output(
    data: &[f32],
    dims: &[i64],
    letterbox: &Letterbox,
    page: &Page,
    score_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<Region>> {
    let candidates = yolo::decode(data, dims, score_threshold).map_err(PaperError::DetectionUnavailable)?;
    let regions = yolo::non_max_suppression(candidates, iou_threshold)
        .into_iter()
        .map(|c| {
            let bbox = letterbox.to_page(&c.bbox, page.width(), page.height());
            Region::new(page.index, c.kind, bbox, c.score)
        })
        .filter(|r| r.bbox.area() > 0.0)
        .collect();
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegionKind;
    use image::RgbImage;

    #[test]
    fn missing_model_is_detection_unavailable() {
        let config = LayoutConfig {
            model_path: PathBuf::from("/nonexistent/layout.onnx"),
            ..LayoutConfig::default()
        };
        let detector = OnnxLayoutDetector::new(&config);
        let page = Page::new(0, RgbImage::new(64, 64));
        match detector.detect(&page) {
            Err(PaperError::DetectionUnavailable(msg)) => assert!(msg.contains("not found")),
            other => panic!("expected DetectionUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn output_is_mapped_back_to_page_pixels() {
        let page = Page::new(4, RgbImage::new(1000, 2000));
        let letterbox = Letterbox::compute(1000, 2000, 640);
        // one Title at page (100,200)-(200,400), one weak Text box
        let n = 2;
        let mut data = vec![0.0f32; 9 * n];
        let (cx, cy, w, h) = (160.0 + 48.0, 96.0, 32.0, 64.0);
        data[0] = cx;
        data[n] = cy;
        data[2 * n] = w;
        data[3 * n] = h;
        data[5 * n] = 0.88;
        data[1] = 300.0;
        data[n + 1] = 300.0;
        data[2 * n + 1] = 10.0;
        data[3 * n + 1] = 10.0;
        data[4 * n + 1] = 0.2;

        let regions = regions_from_output(&data, &[1, 9, 2], &letterbox, &page, 0.5, 0.45).unwrap();
        assert_eq!(regions.len(), 1);
        let title = &regions[0];
        assert_eq!(title.page, 4);
        assert_eq!(title.kind, RegionKind::Title);
        assert_eq!(title.order, None);
        assert!((title.bbox.x0 - 100.0).abs() < 1e-3);
        assert!((title.bbox.y1 - 400.0).abs() < 1e-3);
    }
}
