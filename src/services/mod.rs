pub mod annotation_extract;
pub mod scan_lifecycle;
pub mod text_extract;

pub use scan_lifecycle::{EventOutcome, ScanLifecycle};
