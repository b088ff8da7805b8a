// Pre/post-processing for YOLO-style layout heads
use crate::types::{BBox, RegionKind};
use image::{imageops, imageops::FilterType, Rgb, RgbImage};
use ndarray::ArrayView2;

/// Gray used by the letterbox padding (114/255, the YOLO convention).
const PAD_VALUE: u8 = 114;

/// Mapping between page pixels and the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub size: u32,
}

impl Letterbox {
    pub fn compute(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width.max(1) as f32).min(size as f32 / height.max(1) as f32);
        let new_w = (width as f32 * scale).round();
        let new_h = (height as f32 * scale).round();
        Self {
            scale,
            pad_x: ((size as f32 - new_w) / 2.0).floor(),
            pad_y: ((size as f32 - new_h) / 2.0).floor(),
            size,
        }
    }

    /// Model-space box back to page pixels, clamped to the page.
    pub fn to_page(&self, bbox: &BBox, width: u32, height: u32) -> BBox {
        let w = width as f32;
        let h = height as f32;
        BBox::new(
            ((bbox.x0 - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox.y0 - self.pad_y) / self.scale).clamp(0.0, h),
            ((bbox.x1 - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox.y1 - self.pad_y) / self.scale).clamp(0.0, h),
        )
    }
}

/// Resize with preserved aspect ratio into a padded square, CHW f32 in [0, 1].
pub fn letterbox_tensor(image: &RgbImage, size: u32) -> (Vec<f32>, Letterbox) {
    let lb = Letterbox::compute(image.width(), image.height(), size);
    let new_w = ((image.width() as f32 * lb.scale).round() as u32).clamp(1, size);
    let new_h = ((image.height() as f32 * lb.scale).round() as u32).clamp(1, size);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    imageops::replace(&mut canvas, &resized, lb.pad_x as i64, lb.pad_y as i64);

    let plane = (size * size) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let idx = (y * size + x) as usize;
        for c in 0..3 {
            tensor[c * plane + idx] = pixel[c] as f32 / 255.0;
        }
    }
    (tensor, lb)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: RegionKind,
    pub score: f32,
    pub bbox: BBox,
}

/// Decode a `[1, 4 + C, N]` (or transposed `[1, N, 4 + C]`) head.
///
/// Rows are `cx, cy, w, h` followed by one score per class. Only scores
/// strictly above `score_threshold` survive.
pub fn decode(data: &[f32], dims: &[i64], score_threshold: f32) -> Result<Vec<Candidate>, String> {
    let features = 4 + RegionKind::ALL.len();
    let (a, b) = match dims {
        [1, a, b] => (*a as usize, *b as usize),
        [a, b] => (*a as usize, *b as usize),
        other => return Err(format!("unexpected layout output shape {:?}", other)),
    };
    if a * b != data.len() {
        return Err(format!("output shape {:?} does not match {} values", dims, data.len()));
    }

    let view = ArrayView2::from_shape((a, b), data).map_err(|e| e.to_string())?;
    // channel-major is the usual export; fall back to row-major
    let view = if a == features {
        view
    } else if b == features {
        view.reversed_axes()
    } else {
        return Err(format!("expected {} features per box, got shape {:?}", features, dims));
    };

    let mut candidates = Vec::new();
    for col in view.columns() {
        let (label, score) = col
            .iter()
            .skip(4)
            .enumerate()
            .fold((0usize, f32::MIN), |best, (i, &s)| if s > best.1 { (i, s) } else { best });
        if score <= score_threshold {
            continue;
        }
        let Some(kind) = RegionKind::from_label(label) else {
            continue;
        };
        let (cx, cy, w, h) = (col[0], col[1], col[2], col[3]);
        candidates.push(Candidate {
            kind,
            score,
            bbox: BBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0),
        });
    }
    Ok(candidates)
}

/// Class-wise NMS; survivors come back in descending score order.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.kind == cand.kind && k.bbox.iou(&cand.bbox) > iou_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a channel-major head from (cx, cy, w, h, label, score) tuples.
    fn head(boxes: &[(f32, f32, f32, f32, usize, f32)]) -> (Vec<f32>, Vec<i64>) {
        let features = 9;
        let n = boxes.len();
        let mut data = vec![0.0; features * n];
        for (i, &(cx, cy, w, h, label, score)) in boxes.iter().enumerate() {
            data[i] = cx;
            data[n + i] = cy;
            data[2 * n + i] = w;
            data[3 * n + i] = h;
            data[(4 + label) * n + i] = score;
        }
        (data, vec![1, features as i64, n as i64])
    }

    #[test]
    fn decode_drops_low_confidence() {
        let (data, dims) = head(&[
            (100.0, 100.0, 50.0, 20.0, 1, 0.9),
            (300.0, 300.0, 50.0, 20.0, 0, 0.3),
        ]);
        let cands = decode(&data, &dims, 0.5).unwrap();
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind, RegionKind::Title);
        assert_eq!(cands[0].bbox, BBox::new(75.0, 90.0, 125.0, 110.0));
    }

    #[test]
    fn score_at_threshold_is_dropped() {
        let (data, dims) = head(&[
            (100.0, 100.0, 50.0, 20.0, 3, 0.5),
            (300.0, 300.0, 50.0, 20.0, 4, 0.51),
        ]);
        let cands = decode(&data, &dims, 0.5).unwrap();
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind, RegionKind::Figure);
    }

    #[test]
    fn decode_accepts_row_major_output() {
        let row = [10.0, 10.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.8, 0.1];
        let cands = decode(&row, &[1, 1, 9], 0.5).unwrap();
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind, RegionKind::Table);
    }

    #[test]
    fn decode_rejects_bad_shape() {
        assert!(decode(&[0.0; 12], &[1, 3, 4], 0.5).is_err());
        assert!(decode(&[0.0; 9], &[1, 9, 2], 0.5).is_err());
    }

    #[test]
    fn nms_is_class_wise() {
        let a = Candidate { kind: RegionKind::Text, score: 0.9, bbox: BBox::new(0.0, 0.0, 100.0, 100.0) };
        let b = Candidate { kind: RegionKind::Text, score: 0.8, bbox: BBox::new(5.0, 5.0, 100.0, 100.0) };
        let c = Candidate { kind: RegionKind::Figure, score: 0.7, bbox: BBox::new(5.0, 5.0, 100.0, 100.0) };
        let kept = non_max_suppression(vec![b, c, a], 0.45);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].kind, RegionKind::Figure);
    }

    #[test]
    fn letterbox_round_trips_page_coordinates() {
        let lb = Letterbox::compute(1000, 2000, 640);
        assert!((lb.scale - 0.32).abs() < 1e-6);
        assert_eq!(lb.pad_y, 0.0);
        assert_eq!(lb.pad_x, 160.0);
        let model_box = BBox::new(160.0 + 32.0, 64.0, 160.0 + 64.0, 128.0);
        let page_box = lb.to_page(&model_box, 1000, 2000);
        assert!((page_box.x0 - 100.0).abs() < 1e-3);
        assert!((page_box.y0 - 200.0).abs() < 1e-3);
        assert!((page_box.x1 - 200.0).abs() < 1e-3);
        assert!((page_box.y1 - 400.0).abs() < 1e-3);
    }

    #[test]
    fn letterbox_tensor_has_chw_layout() {
        let image = RgbImage::from_pixel(20, 10, Rgb([255, 0, 0]));
        let (tensor, lb) = letterbox_tensor(&image, 32);
        assert_eq!(tensor.len(), 3 * 32 * 32);
        assert_eq!(lb.pad_y, 8.0);
        let plane = 32 * 32;
        // padded top-left corner is gray, image center is red
        assert!((tensor[0] - 114.0 / 255.0).abs() < 1e-6);
        let center = 16 * 32 + 16;
        assert!((tensor[center] - 1.0).abs() < 1e-6);
        assert!(tensor[plane + center].abs() < 1e-6);
    }
}
