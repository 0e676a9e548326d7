//! 回调入口 - 边界适配器
//!
//! 各处理函数都返回显式的 `AppResult`，这里是唯一把错误映射成
//! "始终确认"约定的地方：对服务商总是返回成功，避免对方重试风暴，
//! 内部错误只写日志。

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tracing::{error, warn};

use crate::error::{AppResult, ErrorKind};
use crate::models::WebhookRoute;
use crate::services::{EventOutcome, ScanLifecycle};

/// 对服务商的确认
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub status: u16,
    /// 内部处理结果，仅供日志和测试，不发给服务商
    pub outcome: Option<EventOutcome>,
}

impl Ack {
    fn received(outcome: Option<EventOutcome>) -> Self {
        Self {
            status: 200,
            outcome,
        }
    }

    pub fn body(&self) -> JsonValue {
        json!({ "received": true })
    }
}

/// 回调处理器
pub struct WebhookHandler {
    lifecycle: Arc<ScanLifecycle>,
}

impl WebhookHandler {
    pub fn new(lifecycle: Arc<ScanLifecycle>) -> Self {
        Self { lifecycle }
    }

    /// 处理一次回调
    ///
    /// # 参数
    /// - `path`: 回调地址前缀之后的路由
    /// - `body`: 原始请求体
    pub async fn handle(&self, path: &str, body: &[u8]) -> Ack {
        let Some(route) = WebhookRoute::parse(path) else {
            warn!("未知回调路由，直接确认: {}", path);
            return Ack::received(None);
        };

        match self.dispatch(&route, body).await {
            Ok(outcome) => Ack::received(Some(outcome)),
            Err(e) => {
                match e.kind() {
                    ErrorKind::Validation => {
                        warn!("[扫描 {}] ⚠️ 回调负载无效 ({}): {}", route.scan_id(), path, e)
                    }
                    _ => error!("[扫描 {}] ❌ 回调处理失败 ({}): {:?}", route.scan_id(), path, e),
                }
                Ack::received(None)
            }
        }
    }

    async fn dispatch(&self, route: &WebhookRoute, body: &[u8]) -> AppResult<EventOutcome> {
        match route {
            WebhookRoute::Status { kind, scan_id } => {
                let payload = parse_json(body)?;
                self.lifecycle.on_status_event(scan_id, *kind, payload).await
            }
            WebhookRoute::NewResult { scan_id } => {
                let payload: JsonValue = parse_json(body)?;
                self.lifecycle.on_new_result(scan_id, payload)
            }
            WebhookRoute::ExportedResult { scan_id, result_id } => {
                let payload = parse_json(body)?;
                self.lifecycle.on_exported_result(scan_id, result_id, payload)
            }
            WebhookRoute::CrawledVersion { scan_id } => {
                // 纯文本正文也是合法的历史格式
                let payload = serde_json::from_slice::<JsonValue>(body)
                    .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(body).into_owned()));
                self.lifecycle.on_crawled_text(scan_id, &payload)
            }
            WebhookRoute::PdfReport { scan_id } => {
                self.lifecycle.on_report_bytes(scan_id, body.to_vec())
            }
            WebhookRoute::ExportCompleted { scan_id } => {
                let payload = parse_json(body)?;
                self.lifecycle.on_export_completed(scan_id, payload)
            }
            WebhookRoute::WritingFeedback { scan_id } => {
                let payload = parse_json(body)?;
                self.lifecycle.on_writing_feedback(scan_id, payload)
            }
        }
    }
}

/// 空正文按空对象处理
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    Ok(serde_json::from_slice(body)?)
}
