// Two-column reading order for academic papers
use crate::types::{BBox, PageLayout, Region, RegionKind};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Right,
}

/// Left iff the horizontal center is strictly before the page midline.
/// A center sitting exactly on the midline belongs to the right column.
pub fn column_of(bbox: &BBox, page_width: u32) -> Column {
    if bbox.center_x() < page_width as f32 / 2.0 {
        Column::Left
    } else {
        Column::Right
    }
}

/// Order the regions of ONE kind on ONE page.
///
/// Left column top-to-bottom, then right column top-to-bottom. Sorting is
/// stable, so equal `y0` values keep detector emission order.
pub fn resolve(regions: Vec<Region>, page_width: u32) -> Vec<Region> {
    let (mut left, mut right): (Vec<Region>, Vec<Region>) = regions
        .into_iter()
        .partition(|r| column_of(&r.bbox, page_width) == Column::Left);

    left.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));
    right.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));

    left.into_iter()
        .chain(right)
        .enumerate()
        .map(|(idx, mut region)| {
            region.order = Some(idx);
            region
        })
        .collect()
}

/// Group a page's raw detections by kind and resolve each group separately.
pub fn build_page_layout(page: usize, width: u32, height: u32, detections: Vec<Region>) -> PageLayout {
    let mut grouped: BTreeMap<RegionKind, Vec<Region>> = BTreeMap::new();
    for region in detections {
        grouped.entry(region.kind).or_default().push(region);
    }

    let regions = grouped
        .into_iter()
        .map(|(kind, group)| (kind, resolve(group, width)))
        .collect();

    PageLayout {
        page,
        width,
        height,
        regions,
    }
}
