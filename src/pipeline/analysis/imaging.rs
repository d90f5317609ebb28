//! Shared image primitives for the detectors.
//!
//! Thin wrappers over `imageproc` plus the few operations it does not
//! provide in the form the detectors need (contour area, HSV banding,
//! dark-blob keypoints).

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::otsu_level;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use super::types::BoundingBox;

/// Closed border of a foreground region with its enclosed area.
#[derive(Debug, Clone)]
pub struct ContourRegion {
    pub points: Vec<Point<i32>>,
    pub area: f64,
}

impl ContourRegion {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        bounding_box(&self.points)
    }
}

/// Blob centre and equivalent-circle diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Count of non-zero pixels.
pub fn count_nonzero(image: &GrayImage) -> usize {
    image.pixels().filter(|p| p[0] > 0).count()
}

/// `part / whole * 100`, 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ═══════════════════════════════════════════════════════════
// Contours
// ═══════════════════════════════════════════════════════════

/// Polygon area by the shoelace formula.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

pub fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

/// Every border in `binary` whose area lies strictly between the bounds.
pub fn contours_in_range(binary: &GrayImage, min_area: f64, max_area: f64) -> Vec<ContourRegion> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter_map(|contour| {
            let area = contour_area(&contour.points);
            (area > min_area && area < max_area).then_some(ContourRegion {
                points: contour.points,
                area,
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Thresholding
// ═══════════════════════════════════════════════════════════

/// Binarize at the Otsu level: brighter than the level becomes 255.
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let mut out = gray.clone();
    for p in out.pixels_mut() {
        p[0] = if p[0] > level { 255 } else { 0 };
    }
    out
}

/// 8-bit HSV in the 0..180 hue convention.
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round().min(255.0) as u8,
        max as u8,
    ]
}

/// 255 where every HSV channel lies inside the inclusive band.
pub fn hsv_mask(image: &RgbImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let hsv = rgb_to_hsv(*image.get_pixel(x, y));
        let inside = (0..3).all(|i| hsv[i] >= lower[i] && hsv[i] <= upper[i]);
        Luma([if inside { 255 } else { 0 }])
    })
}

// ═══════════════════════════════════════════════════════════
// Blobs
// ═══════════════════════════════════════════════════════════

/// Sweep of fixed threshold levels: 50, 60, ..., 210.
const BLOB_THRESHOLDS: std::ops::Range<u8> = 50..220;
const BLOB_THRESHOLD_STEP: usize = 10;
/// Levels a blob must appear at before it is reported.
const MIN_REPEATABILITY: usize = 2;
const MIN_DIST_BETWEEN_BLOBS: f64 = 10.0;
const MIN_INERTIA_RATIO: f64 = 0.1;
const MIN_CONVEXITY: f64 = 0.95;

/// One blob candidate found at a single threshold level.
#[derive(Debug, Clone, Copy)]
struct BlobCenter {
    x: f64,
    y: f64,
    radius: f64,
}

/// Area, centroid and inertia ratio of a closed polygon, from its
/// raw moments accumulated edge by edge.
struct PolygonMoments {
    area: f64,
    cx: f64,
    cy: f64,
    inertia_ratio: f64,
}

fn polygon_moments(points: &[Point<i32>]) -> Option<PolygonMoments> {
    if points.len() < 3 {
        return None;
    }
    let (mut m00, mut m10, mut m01, mut m20, mut m11, mut m02) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        let (xi, yi, xj, yj) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
        let cross = xi * yj - xj * yi;
        m00 += cross;
        m10 += cross * (xi + xj);
        m01 += cross * (yi + yj);
        m20 += cross * (xi * xi + xi * xj + xj * xj);
        m11 += cross * (xi * (2.0 * yi + yj) + xj * (yi + 2.0 * yj));
        m02 += cross * (yi * yi + yi * yj + yj * yj);
    }
    // Border orientation decides the sign
    let sign = if m00 < 0.0 { -1.0 } else { 1.0 };
    let (m00, m10, m01) = (sign * m00 / 2.0, sign * m10 / 6.0, sign * m01 / 6.0);
    let (m20, m11, m02) = (sign * m20 / 12.0, sign * m11 / 24.0, sign * m02 / 12.0);
    if m00 <= f64::EPSILON {
        return None;
    }

    let (cx, cy) = (m10 / m00, m01 / m00);
    let mu20 = m20 - cx * m10;
    let mu11 = m11 - cx * m01;
    let mu02 = m02 - cy * m01;

    let spread = ((2.0 * mu11).powi(2) + (mu20 - mu02).powi(2)).sqrt();
    let total = mu20 + mu02;
    let inertia_ratio = if spread <= 0.01 {
        1.0
    } else if total + spread <= f64::EPSILON {
        0.0
    } else {
        (total - spread) / (total + spread)
    };

    Some(PolygonMoments {
        area: m00,
        cx,
        cy,
        inertia_ratio,
    })
}

/// Candidates at one level: outer borders of the pixels at or below
/// `level`, filtered by area, shape and centre darkness.
fn blobs_at_level(gray: &GrayImage, level: u8, min_area: f64, max_area: f64) -> Vec<BlobCenter> {
    let (width, height) = gray.dimensions();
    let mut dark = gray.clone();
    for p in dark.pixels_mut() {
        p[0] = if p[0] <= level { 255 } else { 0 };
    }

    find_contours::<i32>(&dark)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .filter(|c| {
            !c.points.iter().any(|p| {
                p.x <= 0 || p.y <= 0 || p.x >= width as i32 - 1 || p.y >= height as i32 - 1
            })
        })
        .filter_map(|c| {
            let moments = polygon_moments(&c.points)?;
            if moments.area < min_area || moments.area >= max_area {
                return None;
            }
            if moments.inertia_ratio < MIN_INERTIA_RATIO {
                return None;
            }
            let hull_area = contour_area(&convex_hull(c.points.as_slice()));
            if hull_area <= 0.0 || moments.area / hull_area < MIN_CONVEXITY {
                return None;
            }

            let (px, py) = (moments.cx.round() as u32, moments.cy.round() as u32);
            if px >= width || py >= height || gray.get_pixel(px, py)[0] > level {
                return None;
            }

            let mut dists: Vec<f64> = c
                .points
                .iter()
                .map(|p| (p.x as f64 - moments.cx).hypot(p.y as f64 - moments.cy))
                .collect();
            dists.sort_by(f64::total_cmp);
            let n = dists.len();
            Some(BlobCenter {
                x: moments.cx,
                y: moments.cy,
                radius: (dists[(n - 1) / 2] + dists[n / 2]) / 2.0,
            })
        })
        .collect()
}

/// Dark blobs on a lighter background.
///
/// The image is thresholded at each level of a fixed sweep. Outer
/// borders of dark regions that clear the border, area, inertia-ratio,
/// convexity and centre checks become candidates. Candidates closer
/// than the separation distance (or inside each other's radius) are
/// merged across levels, and only blobs seen at two or more levels are
/// reported. Keypoints come back in order of first detection.
pub fn detect_dark_blobs(gray: &GrayImage, min_area: f64, max_area: f64) -> Vec<Keypoint> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    // Each group stays sorted by radius; its middle entry is the reference.
    let mut groups: Vec<Vec<BlobCenter>> = Vec::new();
    for level in BLOB_THRESHOLDS.step_by(BLOB_THRESHOLD_STEP) {
        let mut fresh = Vec::new();
        for center in blobs_at_level(gray, level, min_area, max_area) {
            let matched = groups.iter_mut().find(|group| {
                let reference = group[group.len() / 2];
                let dist = (reference.x - center.x).hypot(reference.y - center.y);
                dist < MIN_DIST_BETWEEN_BLOBS || dist < reference.radius || dist < center.radius
            });
            match matched {
                Some(group) => {
                    let at = group.partition_point(|c| c.radius <= center.radius);
                    group.insert(at, center);
                }
                None => fresh.push(vec![center]),
            }
        }
        groups.extend(fresh);
    }

    groups
        .into_iter()
        .filter(|group| group.len() >= MIN_REPEATABILITY)
        .map(|group| {
            let n = group.len() as f64;
            Keypoint {
                x: group.iter().map(|c| c.x).sum::<f64>() / n,
                y: group.iter().map(|c| c.y).sum::<f64>() / n,
                size: group[group.len() / 2].radius * 2.0,
            }
        })
        .collect()
}
