//! 查询接口
//!
//! 直接调用方使用的读路径：查询记录、列表、请求高亮、删除，以及新建并提交。
//! 错误按类别映射为状态码；内部错误在生产环境下不返回细节。

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use tracing::error;

use crate::config::Config;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::highlight::{compose, Composition};
use crate::models::{ScanOptions, ScanRecord};
use crate::services::annotation_extract::record_annotations;
use crate::services::ScanLifecycle;

/// 查询接口响应
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl ApiResponse {
    fn ok(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }
}

/// 为一条记录合成高亮
///
/// 导出的对比数据还可能到达时返回 `Conflict`，客户端可以稍后重试；
/// 导出已结束（包括没有匹配结果、无需导出的情况）时按已有的标注合成。
pub fn highlight_record(record: &ScanRecord) -> AppResult<Composition> {
    if record.exported.is_empty() && !record.export_completed() {
        return Err(AppError::conflict(format!(
            "扫描 {} 尚未收到导出的对比数据",
            record.scan_id
        )));
    }
    Ok(compose(record.highlight_text(), &record_annotations(record)))
}

/// 查询接口
pub struct QueryApi {
    lifecycle: Arc<ScanLifecycle>,
    production: bool,
}

impl QueryApi {
    pub fn new(lifecycle: Arc<ScanLifecycle>, config: &Config) -> Self {
        Self {
            lifecycle,
            production: config.production,
        }
    }

    /// 新建并提交
    pub async fn create_scan(&self, text: &str, options: ScanOptions) -> ApiResponse {
        let record = match self.lifecycle.create(text, options) {
            Ok(record) => record,
            Err(e) => return self.error_response(e),
        };
        match self.lifecycle.submit(&record.scan_id).await {
            Ok(()) => ApiResponse::ok(201, json!({ "scanId": record.scan_id })),
            Err(e) => self.error_response(e),
        }
    }

    pub fn get_record(&self, scan_id: &str) -> ApiResponse {
        self.respond(200, || {
            let record = self.lifecycle.get(scan_id)?;
            let mut body = serde_json::to_value(&record)
                .map_err(|e| AppError::internal(format!("记录序列化失败: {}", e)))?;
            body["has_report"] = json!(record.report.is_some());
            Ok(body)
        })
    }

    pub fn list_records(&self) -> ApiResponse {
        self.respond(200, || {
            let summaries = self.lifecycle.list()?;
            serde_json::to_value(summaries)
                .map_err(|e| AppError::internal(format!("列表序列化失败: {}", e)))
        })
    }

    pub fn highlight(&self, scan_id: &str) -> ApiResponse {
        self.respond(200, || {
            let record = self.lifecycle.get(scan_id)?;
            let composition = highlight_record(&record)?;
            serde_json::to_value(composition)
                .map_err(|e| AppError::internal(format!("高亮结果序列化失败: {}", e)))
        })
    }

    /// 删除是幂等的，记录不存在也返回 204
    pub async fn delete(&self, scan_id: &str) -> ApiResponse {
        match self.lifecycle.delete(scan_id).await {
            Ok(_) => ApiResponse::ok(204, JsonValue::Null),
            Err(e) => self.error_response(e),
        }
    }

    fn respond(&self, status: u16, f: impl FnOnce() -> AppResult<JsonValue>) -> ApiResponse {
        match f() {
            Ok(body) => ApiResponse::ok(status, body),
            Err(e) => self.error_response(e),
        }
    }

    fn error_response(&self, e: AppError) -> ApiResponse {
        let (status, name) = match e.kind() {
            ErrorKind::Validation => (400, "validation"),
            ErrorKind::NotFound => (404, "not_found"),
            ErrorKind::Conflict => (409, "conflict"),
            ErrorKind::Provider if e.is_retryable() => (503, "provider"),
            ErrorKind::Provider => (502, "provider"),
            ErrorKind::Internal => (500, "internal"),
        };

        let message = if e.kind() == ErrorKind::Internal {
            error!("查询接口内部错误: {:?}", e);
            if self.production {
                "internal error".to_string()
            } else {
                e.to_string()
            }
        } else {
            e.to_string()
        };

        ApiResponse::ok(
            status,
            json!({ "error": name, "message": message, "retryable": e.is_retryable() }),
        )
    }
}
