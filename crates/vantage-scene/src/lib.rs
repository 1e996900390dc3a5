//! Scene composition and GPU id-buffer picking.

pub mod error;
pub mod pick;
pub mod ray;
mod scene;

pub use error::{SceneError, SceneResult};
pub use pick::{MAX_MODELS, decode_pick_pixel, encode_pick_id, ndc_to_pixel};
pub use ray::intersect_plane;
pub use scene::{Scene, SceneOptions};
