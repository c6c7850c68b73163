pub mod attachments;
pub mod filesystem;

pub use attachments::{existing, existing_paths, AttachmentStore, Upload};
pub use filesystem::FileStorage;
