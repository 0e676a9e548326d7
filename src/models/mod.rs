pub mod annotation;
pub mod events;
pub mod loaders;
pub mod record;
pub mod route;

pub use annotation::{Annotation, AnnotationFamily, AnnotationMeta, Category};
pub use events::StatusKind;
pub use loaders::{load_all_replays, load_replay, ReplayEvent, ReplayFixture};
pub use record::{ExportedResult, RecordSummary, ScanOptions, ScanRecord, ScanStatus, ScanSummary};
pub use route::WebhookRoute;
