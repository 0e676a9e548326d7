//! 离线客户端
//!
//! 未配置服务商令牌时使用（例如回放录制好的回调），所有调用直接成功。

use async_trait::async_trait;
use tracing::info;

use crate::clients::provider_client::{ExportRequest, ProviderClient, SubmitRequest};
use crate::error::AppResult;

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProviderClient;

#[async_trait]
impl ProviderClient for OfflineProviderClient {
    async fn submit_scan(&self, request: &SubmitRequest) -> AppResult<()> {
        info!("[离线] 跳过提交: {}", request.scan_id);
        Ok(())
    }

    async fn export_results(&self, request: &ExportRequest) -> AppResult<()> {
        info!(
            "[离线] 跳过导出: {} ({} 个结果)",
            request.scan_id,
            request.results.len()
        );
        Ok(())
    }

    async fn delete_scan(&self, scan_id: &str) -> AppResult<()> {
        info!("[离线] 跳过远端删除: {}", scan_id);
        Ok(())
    }
}
