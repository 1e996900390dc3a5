//! Pick-id encoding for the offscreen id pass.
//!
//! A model's attachment index goes into the red channel; alpha is always
//! opaque for a hit, so a transparent pixel means nothing was drawn there and
//! index 0 stays a valid model.

use glam::{Vec2, Vec4};

/// Largest number of models the red channel can address.
pub const MAX_MODELS: usize = 255;

pub fn encode_pick_id(index: u8) -> Vec4 {
    Vec4::new(f32::from(index) / 255.0, 0.0, 0.0, 1.0)
}

/// Model index stored in a pick-buffer pixel, or `None` on a miss.
pub fn decode_pick_pixel(pixel: [u8; 4]) -> Option<u8> {
    (pixel[3] == u8::MAX).then_some(pixel[0])
}

/// Pixel under an NDC position, with `(0, 0)` at the top-left. Anything
/// outside `[-1, 1]²` (including NaN) has no pixel.
pub fn ndc_to_pixel(ndc: Vec2, width: u32, height: u32) -> Option<(u32, u32)> {
    if !(-1.0..=1.0).contains(&ndc.x) || !(-1.0..=1.0).contains(&ndc.y) {
        return None;
    }
    if width == 0 || height == 0 {
        return None;
    }
    let px = ((ndc.x + 1.0) / 2.0 * width as f32) as u32;
    let py = ((1.0 - ndc.y) / 2.0 * height as f32) as u32;
    Some((px.min(width - 1), py.min(height - 1)))
}
