pub mod bbox;
pub mod image;
pub mod overlay;

pub use bbox::{BoundingBox, BoxExtraction, extract_bounding_box};
pub use image::{IngestError, UploadedImage};
pub use overlay::{Overlay, draw_bounding_box};
