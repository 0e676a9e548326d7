//! 扫描生命周期控制器 - 业务能力层
//!
//! 把服务商乱序、至少一次投递的回调收敛成每个扫描一致的状态，
//! 并在扫描完成时触发且只触发一次导出。
//!
//! ## 加锁约定
//!
//! 记录只在 `RecordStore::update` 的闭包里修改，闭包内不做任何 I/O。
//! 所有服务商调用都遵循"加锁 → 快照/置位 → 解锁 → 远程调用 → 再加锁回写"，
//! 慢的导出请求不会阻塞同一扫描的其他回调，更不会阻塞其他扫描。

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::{retry_with_backoff, ExportRequest, ExportTarget, ProviderClient, RetryPolicy, SubmitRequest};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::events::{
    ExportCompletedPayload, ExportedResultPayload, StatusKind, StatusPayload, WritingFeedbackPayload,
};
use crate::models::{
    ExportedResult, RecordSummary, ScanOptions, ScanRecord, ScanStatus, ScanSummary, WebhookRoute,
};
use crate::services::annotation_extract::editorial_annotations;
use crate::services::text_extract::extract_processed_text;
use crate::store::{RecordStore, RecordStoreExt};
use crate::utils::logging::truncate_text;

/// 回调处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// 已写入记录
    Applied,
    /// 扫描 ID 未知（迟到的回调或记录已删除），直接确认，无副作用
    UnknownScan,
    /// 记录存在但事件不再适用（例如失败后的完成回调）
    Ignored,
}

/// 完成回调在记录锁内做出的决定
enum CompletionStep {
    Export(Vec<String>),
    AlreadyExporting,
    Rejected(ScanStatus),
}

/// 扫描生命周期控制器
pub struct ScanLifecycle {
    store: Arc<dyn RecordStore>,
    client: Arc<dyn ProviderClient>,
    retry_policy: RetryPolicy,
    webhook_base_url: String,
}

impl ScanLifecycle {
    /// 创建新的控制器
    pub fn new(store: Arc<dyn RecordStore>, client: Arc<dyn ProviderClient>, config: &Config) -> Self {
        Self {
            store,
            client,
            retry_policy: config.retry_policy(),
            webhook_base_url: config.webhook_base_url.clone(),
        }
    }

    // ========== 提交 ==========

    /// 新建记录，状态为 `Queued`
    ///
    /// 文本为空（或只有空白）时返回校验错误。
    pub fn create(&self, text: &str, options: ScanOptions) -> AppResult<ScanRecord> {
        if text.trim().is_empty() {
            return Err(AppError::validation("提交文本不能为空"));
        }

        let scan_id = match options.scan_id.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("扫描 ID 不能为空字符串")),
            Some(id) if !WebhookRoute::is_safe_segment(id) => {
                return Err(AppError::validation(format!(
                    "扫描 ID 不能包含 '/'、'?'、'#'、'%' 或空白: {}",
                    id
                )))
            }
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let record = ScanRecord::new(scan_id.clone(), text, options);
        self.store.insert(record.clone())?;

        info!(
            "[扫描 {}] 📝 已创建，文本: {}",
            scan_id,
            truncate_text(text, 40)
        );
        Ok(record)
    }

    /// 提交到服务商
    ///
    /// 成功后进入 `Pending`；失败时记录进入 `Error` 并把错误原样返回，
    /// 调用方通过 `AppError::is_retryable` 区分是否值得重新提交。
    pub async fn submit(&self, scan_id: &str) -> AppResult<()> {
        let record = self.get(scan_id)?;
        if record.status != ScanStatus::Queued {
            return Err(AppError::validation(format!(
                "扫描 {} 当前状态为 {}，不能重复提交",
                scan_id, record.status
            )));
        }

        let request = SubmitRequest {
            scan_id: scan_id.to_string(),
            text: record.text.clone(),
            filename: record
                .options
                .filename
                .clone()
                .unwrap_or_else(|| format!("{}.txt", scan_id)),
            sandbox: record.options.sandbox,
            status_webhook: WebhookRoute::status_template(&self.webhook_base_url, scan_id),
            new_result_webhook: WebhookRoute::NewResult {
                scan_id: scan_id.to_string(),
            }
            .url(&self.webhook_base_url),
        };

        match self.client.submit_scan(&request).await {
            Ok(()) => {
                // 完成回调可能先于提交响应到达，此时保持原状态
                self.store.modify(scan_id, |r| r.transition(ScanStatus::Pending))?;
                info!("[扫描 {}] 📤 已提交，等待服务商回调", scan_id);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.store.modify(scan_id, |r| {
                    if r.transition(ScanStatus::Error) {
                        r.error = Some(message.clone());
                    }
                })?;
                warn!(
                    "[扫描 {}] ❌ 提交失败 (可重试: {}): {}",
                    scan_id,
                    e.is_retryable(),
                    e
                );
                Err(e)
            }
        }
    }

    // ========== 回调 ==========

    /// 状态回调
    pub async fn on_status_event(
        &self,
        scan_id: &str,
        kind: StatusKind,
        payload: StatusPayload,
    ) -> AppResult<EventOutcome> {
        match kind {
            StatusKind::Completed => self.on_completed(scan_id, payload).await,
            StatusKind::Error => {
                let message = payload.error_message();
                let applied = self.store.modify(scan_id, |r| {
                    if r.transition(ScanStatus::Error) {
                        r.error = Some(message.clone());
                        true
                    } else {
                        false
                    }
                })?;
                match applied {
                    None => Ok(self.unknown(scan_id, "error")),
                    Some(true) => {
                        warn!("[扫描 {}] ❌ 服务商报告失败: {}", scan_id, message);
                        Ok(EventOutcome::Applied)
                    }
                    Some(false) => {
                        warn!("[扫描 {}] ⚠️ 终态下收到失败回调，忽略: {}", scan_id, message);
                        Ok(EventOutcome::Ignored)
                    }
                }
            }
            StatusKind::CreditsChecked => {
                let credits = payload.credits_value();
                let found = self.store.modify(scan_id, |r| {
                    r.credits = credits;
                    r.touch();
                })?;
                match found {
                    None => Ok(self.unknown(scan_id, "creditsChecked")),
                    Some(()) => {
                        debug!("[扫描 {}] 点数检查: {:?}", scan_id, credits);
                        Ok(EventOutcome::Applied)
                    }
                }
            }
        }
    }

    async fn on_completed(&self, scan_id: &str, payload: StatusPayload) -> AppResult<EventOutcome> {
        let all_ids = payload.result_ids();
        let summary = ScanSummary {
            total_matches: all_ids.len(),
            aggregated_score: payload
                .results
                .as_ref()
                .and_then(|r| r.score.as_ref())
                .and_then(|s| s.aggregated_score),
            total_words: payload.scanned_document.as_ref().and_then(|d| d.total_words),
        };
        let credits = payload.credits_value();

        // 无法还原成回调路由的结果 ID 不导出，否则导出的数据会落到未知路由上
        let (result_ids, skipped): (Vec<String>, Vec<String>) = all_ids
            .into_iter()
            .partition(|id| WebhookRoute::is_safe_segment(id));
        if !skipped.is_empty() {
            warn!(
                "[扫描 {}] ⚠️ 跳过 {} 个无法用作回调路径的结果 ID: {:?}",
                scan_id,
                skipped.len(),
                skipped
            );
        }

        // 测试并置位 export_started 与状态迁移在同一把记录锁内完成
        let step = self.store.modify(scan_id, |r| {
            if r.status == ScanStatus::Error {
                return CompletionStep::Rejected(r.status);
            }
            r.transition(ScanStatus::Completed);
            r.summary = Some(summary);
            if credits.is_some() {
                r.credits = credits;
            }
            match r.try_begin_export(result_ids) {
                Some(ids) => CompletionStep::Export(ids),
                None => CompletionStep::AlreadyExporting,
            }
        })?;

        match step {
            None => Ok(self.unknown(scan_id, "completed")),
            Some(CompletionStep::Rejected(status)) => {
                warn!("[扫描 {}] ⚠️ 状态为 {} 时收到完成回调，忽略", scan_id, status);
                Ok(EventOutcome::Ignored)
            }
            Some(CompletionStep::AlreadyExporting) => {
                info!("[扫描 {}] 重复的完成回调，导出已触发过", scan_id);
                Ok(EventOutcome::Applied)
            }
            Some(CompletionStep::Export(ids)) => {
                info!("[扫描 {}] ✓ 扫描完成，匹配 {} 个结果", scan_id, ids.len());
                self.trigger_export(scan_id, ids).await?;
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// 发起导出（已在锁外）
    ///
    /// 失败时只记录错误，不回滚 `export_started`：一次完成回调对应一次导出尝试。
    async fn trigger_export(&self, scan_id: &str, result_ids: Vec<String>) -> AppResult<()> {
        if result_ids.is_empty() {
            self.store.modify(scan_id, |r| {
                r.export_completed_at = Some(Utc::now());
                r.touch();
            })?;
            info!("[扫描 {}] 没有匹配结果，无需导出", scan_id);
            return Ok(());
        }

        let request = self.build_export_request(scan_id, &result_ids);
        info!("[扫描 {}] 📦 请求导出 {} 个结果", scan_id, request.results.len());

        let result = retry_with_backoff(&self.retry_policy, "导出请求", || {
            self.client.export_results(&request)
        })
        .await;

        if let Err(e) = &result {
            let message = e.to_string();
            self.store.modify(scan_id, |r| {
                r.export_error = Some(message.clone());
                r.touch();
            })?;
            warn!("[扫描 {}] ❌ 导出请求失败: {}", scan_id, e);
        }

        result
    }

    fn build_export_request(&self, scan_id: &str, result_ids: &[String]) -> ExportRequest {
        let base = &self.webhook_base_url;
        ExportRequest {
            scan_id: scan_id.to_string(),
            export_id: scan_id.to_string(),
            results: result_ids
                .iter()
                .map(|id| ExportTarget {
                    id: id.clone(),
                    endpoint: WebhookRoute::ExportedResult {
                        scan_id: scan_id.to_string(),
                        result_id: id.clone(),
                    }
                    .url(base),
                })
                .collect(),
            crawled_version_endpoint: WebhookRoute::CrawledVersion {
                scan_id: scan_id.to_string(),
            }
            .url(base),
            pdf_report_endpoint: WebhookRoute::PdfReport {
                scan_id: scan_id.to_string(),
            }
            .url(base),
            completion_webhook: WebhookRoute::ExportCompleted {
                scan_id: scan_id.to_string(),
            }
            .url(base),
        }
    }

    /// 增量匹配：不论当前状态和到达顺序都追加，不触发导出
    pub fn on_new_result(&self, scan_id: &str, payload: JsonValue) -> AppResult<EventOutcome> {
        let count = self.store.modify(scan_id, |r| {
            r.new_results.push(payload);
            r.touch();
            r.new_results.len()
        })?;
        match count {
            None => Ok(self.unknown(scan_id, "new-result")),
            Some(n) => {
                debug!("[扫描 {}] 收到增量匹配，累计 {} 条", scan_id, n);
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// 单个导出结果，同一结果 ID 后写覆盖
    pub fn on_exported_result(
        &self,
        scan_id: &str,
        result_id: &str,
        payload: ExportedResultPayload,
    ) -> AppResult<EventOutcome> {
        let exported = ExportedResult {
            result_id: result_id.to_string(),
            url: payload.url,
            title: payload.title,
            comparison: payload.text.comparison,
        };
        let found = self.store.modify(scan_id, |r| {
            r.exported.insert(result_id.to_string(), exported);
            r.touch();
        })?;
        match found {
            None => Ok(self.unknown(scan_id, "exported-result")),
            Some(()) => {
                debug!("[扫描 {}] 收到导出结果 {}", scan_id, result_id);
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// 处理后文本
    pub fn on_crawled_text(&self, scan_id: &str, payload: &JsonValue) -> AppResult<EventOutcome> {
        let Some((shape, text)) = extract_processed_text(payload) else {
            if self.store.get(scan_id)?.is_none() {
                return Ok(self.unknown(scan_id, "crawled-version"));
            }
            return Err(AppError::validation("无法从负载中提取处理后文本"));
        };
        let chars = text.chars().count();
        let found = self.store.modify(scan_id, |r| {
            r.crawled_text = Some(text);
            r.touch();
        })?;
        match found {
            None => Ok(self.unknown(scan_id, "crawled-version")),
            Some(()) => {
                debug!("[扫描 {}] 收到处理后文本 ({} 格式, {} 字符)", scan_id, shape, chars);
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// PDF 报告原始字节
    pub fn on_report_bytes(&self, scan_id: &str, bytes: Vec<u8>) -> AppResult<EventOutcome> {
        let size = bytes.len();
        let found = self.store.modify(scan_id, |r| {
            r.report = Some(bytes);
            r.touch();
        })?;
        match found {
            None => Ok(self.unknown(scan_id, "pdf-report")),
            Some(()) => {
                debug!("[扫描 {}] 收到报告 {} 字节", scan_id, size);
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// 导出完成
    pub fn on_export_completed(
        &self,
        scan_id: &str,
        payload: ExportCompletedPayload,
    ) -> AppResult<EventOutcome> {
        let healthy = payload.all_healthy();
        let found = self.store.modify(scan_id, |r| {
            r.export_completed_at = Some(Utc::now());
            r.export_healthy = Some(healthy);
            r.touch();
        })?;
        match found {
            None => Ok(self.unknown(scan_id, "export-completed")),
            Some(()) => {
                if healthy {
                    info!("[扫描 {}] ✅ 导出完成", scan_id);
                } else {
                    warn!(
                        "[扫描 {}] ⚠️ 导出完成但部分任务失败 ({} 个任务)",
                        scan_id,
                        payload.tasks.len()
                    );
                }
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// 写作反馈，整体后写覆盖
    pub fn on_writing_feedback(
        &self,
        scan_id: &str,
        payload: WritingFeedbackPayload,
    ) -> AppResult<EventOutcome> {
        let annotations = editorial_annotations(&payload);
        let count = annotations.len();
        let found = self.store.modify(scan_id, |r| {
            r.editorial = annotations;
            r.touch();
        })?;
        match found {
            None => Ok(self.unknown(scan_id, "writing-feedback")),
            Some(()) => {
                debug!("[扫描 {}] 收到写作反馈 {} 条", scan_id, count);
                Ok(EventOutcome::Applied)
            }
        }
    }

    fn unknown(&self, scan_id: &str, event: &str) -> EventOutcome {
        debug!("[扫描 {}] 未知扫描的 {} 回调，直接确认", scan_id, event);
        EventOutcome::UnknownScan
    }

    // ========== 查询与删除 ==========

    pub fn get(&self, scan_id: &str) -> AppResult<ScanRecord> {
        self.store
            .get(scan_id)?
            .ok_or_else(|| AppError::not_found(scan_id))
    }

    pub fn list(&self) -> AppResult<Vec<RecordSummary>> {
        Ok(self.store.list()?.iter().map(ScanRecord::summarize).collect())
    }

    /// 删除记录，并尽力通知服务商删除远端副本
    ///
    /// 远端失败只记录警告；本地删除总是生效。记录不存在时返回 `Ok(false)`。
    pub async fn delete(&self, scan_id: &str) -> AppResult<bool> {
        if self.store.delete(scan_id)?.is_none() {
            debug!("[扫描 {}] 删除时记录不存在", scan_id);
            return Ok(false);
        }

        info!("[扫描 {}] 🗑️ 本地记录已删除", scan_id);
        if let Err(e) = self.client.delete_scan(scan_id).await {
            warn!("[扫描 {}] ⚠️ 远端删除失败（已忽略）: {}", scan_id, e);
        }
        Ok(true)
    }
}
