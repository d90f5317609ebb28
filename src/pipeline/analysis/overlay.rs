//! Overlay rendering and PNG data-URI encoding.

use std::io::Cursor;

use base64::Engine;
use image::{GrayImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use super::imaging::{ContourRegion, Keypoint};
use super::AnalysisError;

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Trace each contour as a closed polyline `thickness` pixels wide.
pub fn draw_contours(canvas: &mut RgbImage, contours: &[ContourRegion], color: Rgb<u8>, thickness: u32) {
    let spread = thickness.max(1) as f32;
    for contour in contours {
        let points = &contour.points;
        for (i, a) in points.iter().enumerate() {
            let b = &points[(i + 1) % points.len()];
            for step in 0..thickness.max(1) {
                let off = step as f32 - (spread - 1.0) / 2.0;
                let (ax, ay, bx, by) = (a.x as f32, a.y as f32, b.x as f32, b.y as f32);
                draw_line_segment_mut(canvas, (ax + off, ay), (bx + off, by), color);
                draw_line_segment_mut(canvas, (ax, ay + off), (bx, by + off), color);
            }
        }
    }
}

/// Circle of the keypoint's diameter around each keypoint.
pub fn draw_keypoints(canvas: &mut RgbImage, keypoints: &[Keypoint], color: Rgb<u8>) {
    for kp in keypoints {
        let radius = ((kp.size / 2.0).round() as i32).max(1);
        draw_hollow_circle_mut(canvas, (kp.x.round() as i32, kp.y.round() as i32), radius, color);
    }
}

/// Paint every masked pixel in `color`.
pub fn paint_mask(canvas: &mut RgbImage, mask: &GrayImage, color: Rgb<u8>) {
    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] > 0 && x < canvas.width() && y < canvas.height() {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// `image * weight + edges * (1 - weight)` per channel, edges taken as grey.
pub fn blend_edges(image: &RgbImage, edges: &GrayImage, image_weight: f32) -> RgbImage {
    let w = image_weight.clamp(0.0, 1.0);
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let src = image.get_pixel(x, y);
        let edge = edges.get_pixel(x, y)[0] as f32;
        Rgb(src.0.map(|c| (c as f32 * w + edge * (1.0 - w)).round().clamp(0.0, 255.0) as u8))
    })
}

pub fn encode_png_data_uri(image: &RgbImage) -> Result<String, AnalysisError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(AnalysisError::Encode)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    ))
}

#[cfg(test)]
pub(crate) fn decode_data_uri(uri: &str) -> RgbImage {
    let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgb8()
}
