//! Body silhouette regions. A selection is placed at the region's polygon
//! centroid, never at a raw pointer position.

use crate::models::{BodyMapSelection, BodyRegion};

pub const VIEW_WIDTH: f64 = 220.0;
pub const VIEW_HEIGHT: f64 = 500.0;

pub fn polygon(region: BodyRegion) -> &'static [(f64, f64)] {
    match region {
        BodyRegion::Head => &[
            (110.0, 40.0),
            (130.0, 40.0),
            (140.0, 60.0),
            (130.0, 80.0),
            (110.0, 80.0),
            (100.0, 60.0),
        ],
        BodyRegion::Neck => &[(110.0, 82.0), (130.0, 82.0), (130.0, 95.0), (110.0, 95.0)],
        BodyRegion::Chest => &[(85.0, 95.0), (155.0, 95.0), (155.0, 140.0), (85.0, 140.0)],
        BodyRegion::Stomach => &[(90.0, 140.0), (150.0, 140.0), (150.0, 190.0), (90.0, 190.0)],
        BodyRegion::LeftArm => &[(70.0, 100.0), (85.0, 100.0), (85.0, 180.0), (70.0, 180.0)],
        BodyRegion::RightArm => &[(155.0, 100.0), (170.0, 100.0), (170.0, 180.0), (155.0, 180.0)],
        BodyRegion::LeftHand => &[(65.0, 180.0), (85.0, 180.0), (85.0, 200.0), (65.0, 200.0)],
        BodyRegion::RightHand => &[(155.0, 180.0), (175.0, 180.0), (175.0, 200.0), (155.0, 200.0)],
        BodyRegion::Hips => &[(90.0, 190.0), (150.0, 190.0), (150.0, 220.0), (90.0, 220.0)],
        BodyRegion::LeftLeg => &[(95.0, 220.0), (120.0, 220.0), (120.0, 330.0), (95.0, 330.0)],
        BodyRegion::RightLeg => &[(120.0, 220.0), (145.0, 220.0), (145.0, 330.0), (120.0, 330.0)],
        BodyRegion::LeftFoot => &[(90.0, 330.0), (120.0, 330.0), (120.0, 355.0), (90.0, 355.0)],
        BodyRegion::RightFoot => &[(120.0, 330.0), (150.0, 330.0), (150.0, 355.0), (120.0, 355.0)],
    }
}

/// Area centroid of a simple polygon. Degenerate (zero-area) polygons fall
/// back to the vertex average.
pub fn centroid(points: &[(f64, f64)]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }

    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut previous = points[points.len() - 1];
    for &current in points {
        let cross = previous.0 * current.1 - current.0 * previous.1;
        area += cross;
        cx += (previous.0 + current.0) * cross;
        cy += (previous.1 + current.1) * cross;
        previous = current;
    }
    area *= 0.5;

    if area == 0.0 {
        let n = points.len() as f64;
        let sx: f64 = points.iter().map(|point| point.0).sum();
        let sy: f64 = points.iter().map(|point| point.1).sum();
        return (sx / n, sy / n);
    }

    (cx / (6.0 * area), cy / (6.0 * area))
}

pub fn selection_for(region: BodyRegion) -> BodyMapSelection {
    let (x, y) = centroid(polygon(region));
    BodyMapSelection {
        body_part: region,
        x: (x / VIEW_WIDTH * 100.0).clamp(0.0, 100.0),
        y: (y / VIEW_HEIGHT * 100.0).clamp(0.0, 100.0),
    }
}

/// One marker per distinct region, in the order first given.
pub fn selections_for(regions: &[BodyRegion]) -> Vec<BodyMapSelection> {
    let mut seen = Vec::with_capacity(regions.len());
    for region in regions {
        if !seen.contains(region) {
            seen.push(*region);
        }
    }
    seen.into_iter().map(selection_for).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_centroid_is_its_center() {
        let (x, y) = centroid(polygon(BodyRegion::LeftArm));
        assert!((x - 77.5).abs() < 1e-9);
        assert!((y - 140.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_polygon_uses_vertex_average() {
        let (x, y) = centroid(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        assert_eq!((x, y), (10.0, 0.0));
    }

    #[test]
    fn selection_is_normalized_to_percentages() {
        let point = selection_for(BodyRegion::LeftArm);
        assert_eq!(point.body_part, BodyRegion::LeftArm);
        assert!((point.x - 77.5 / 220.0 * 100.0).abs() < 1e-9);
        assert!((point.y - 28.0).abs() < 1e-9);
    }

    #[test]
    fn every_region_lands_inside_the_frame() {
        for region in BodyRegion::ALL {
            let point = selection_for(region);
            assert!((0.0..=100.0).contains(&point.x), "{region} x");
            assert!((0.0..=100.0).contains(&point.y), "{region} y");
        }
    }

    #[test]
    fn repeated_regions_collapse() {
        let points = selections_for(&[BodyRegion::Head, BodyRegion::Chest, BodyRegion::Head]);
        let parts: Vec<BodyRegion> = points.iter().map(|point| point.body_part).collect();
        assert_eq!(parts, vec![BodyRegion::Head, BodyRegion::Chest]);
    }
}
