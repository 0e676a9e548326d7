/// 文本分析服务商 API 客户端
///
/// 封装提交、导出、删除三个远程调用。鉴权令牌由外部获取后通过配置传入。
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppResult, ProviderError};

/// 提交请求
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub scan_id: String,
    pub text: String,
    pub filename: String,
    pub sandbox: bool,
    /// 状态回调模板（含 `{STATUS}` 占位符）
    pub status_webhook: String,
    pub new_result_webhook: String,
}

/// 单个结果的导出目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTarget {
    pub id: String,
    pub endpoint: String,
}

/// 导出请求
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub scan_id: String,
    pub export_id: String,
    pub results: Vec<ExportTarget>,
    pub crawled_version_endpoint: String,
    pub pdf_report_endpoint: String,
    pub completion_webhook: String,
}

impl ExportRequest {
    pub fn result_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.id.as_str()).collect()
    }
}

/// 服务商客户端接口
///
/// 实现方只负责单次调用；重试由调用方按 `RetryPolicy` 执行。
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn submit_scan(&self, request: &SubmitRequest) -> AppResult<()>;

    async fn export_results(&self, request: &ExportRequest) -> AppResult<()>;

    async fn delete_scan(&self, scan_id: &str) -> AppResult<()>;
}

/// 基于 HTTP 的服务商客户端
pub struct HttpProviderClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpProviderClient {
    /// 创建新的服务商客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.provider_api_base_url.trim_end_matches('/').to_string(),
            token: config.provider_api_token.clone(),
        }
    }

    /// 发送请求并把非 2xx 响应转换为 `ProviderError`
    async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> AppResult<()> {
        let response = request
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::connection(endpoint, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("{} 调用成功: {}", endpoint, status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(endpoint, status.as_u16(), body).into())
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn submit_scan(&self, request: &SubmitRequest) -> AppResult<()> {
        let url = format!("{}/v3/scans/submit/file/{}", self.base_url, request.scan_id);
        let body = json!({
            "base64": base64::engine::general_purpose::STANDARD.encode(request.text.as_bytes()),
            "filename": request.filename,
            "properties": {
                "sandbox": request.sandbox,
                "webhooks": {
                    "status": request.status_webhook,
                    "newResult": request.new_result_webhook
                }
            }
        });

        debug!("提交扫描: {}", url);
        self.send("submit", self.http.put(&url).json(&body)).await
    }

    async fn export_results(&self, request: &ExportRequest) -> AppResult<()> {
        let url = format!(
            "{}/v3/downloads/{}/export/{}",
            self.base_url, request.scan_id, request.export_id
        );
        let results: Vec<_> = request
            .results
            .iter()
            .map(|r| json!({ "id": r.id, "verb": "POST", "endpoint": r.endpoint }))
            .collect();
        let body = json!({
            "results": results,
            "crawledVersion": { "verb": "POST", "endpoint": request.crawled_version_endpoint },
            "pdfReport": { "verb": "POST", "endpoint": request.pdf_report_endpoint },
            "completionWebhook": request.completion_webhook,
            "maxRetries": 3
        });

        debug!("请求导出 {} 个结果: {}", request.results.len(), url);
        self.send("export", self.http.post(&url).json(&body)).await
    }

    async fn delete_scan(&self, scan_id: &str) -> AppResult<()> {
        let url = format!("{}/v3.1/scans/delete", self.base_url);
        let body = json!({ "scans": [{ "id": scan_id }], "purge": false });

        debug!("删除远端扫描: {}", scan_id);
        self.send("delete", self.http.patch(&url).json(&body)).await
    }
}
