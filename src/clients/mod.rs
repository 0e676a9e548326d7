pub mod offline_client;
pub mod provider_client;
pub mod retry;

pub use offline_client::OfflineProviderClient;
pub use provider_client::{ExportRequest, ExportTarget, HttpProviderClient, ProviderClient, SubmitRequest};
pub use retry::{retry_with_backoff, RetryPolicy};
