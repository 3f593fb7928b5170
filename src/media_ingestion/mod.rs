pub mod format;
pub mod upload;

pub use format::EncodeFormat;
pub use upload::{UploadedFile, read_upload};
