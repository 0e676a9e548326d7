//! 扫描记录
//!
//! 一份提交文档对应一条记录，只由生命周期控制器修改。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::annotation::Annotation;
use crate::models::events::Comparison;

/// 扫描状态
///
/// `Queued → Pending → {Completed, Error}`，只能向前推进。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Queued,
    Pending,
    Completed,
    Error,
}

impl ScanStatus {
    fn rank(self) -> u8 {
        match self {
            ScanStatus::Queued => 0,
            ScanStatus::Pending => 1,
            ScanStatus::Completed | ScanStatus::Error => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }

    /// 是否允许从当前状态迁移到 `next`
    pub fn can_transition_to(self, next: ScanStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScanStatus::Queued => "queued",
            ScanStatus::Pending => "pending",
            ScanStatus::Completed => "completed",
            ScanStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// 提交选项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    /// 调用方指定的扫描 ID，不指定时自动生成
    #[serde(default)]
    pub scan_id: Option<String>,
    /// 沙箱模式（服务商不计费，返回模拟结果）
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default)]
    pub filename: Option<String>,
}

/// 完成回调带来的汇总信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_matches: usize,
    pub aggregated_score: Option<f64>,
    pub total_words: Option<u64>,
}

/// 已导出的单个对比结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportedResult {
    pub result_id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub comparison: Comparison,
}

/// 扫描记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub status: ScanStatus,
    pub options: ScanOptions,
    /// 原始提交文本
    pub text: String,
    /// 增量匹配（按到达顺序，可能重复）
    pub new_results: Vec<JsonValue>,
    /// 结果 ID → 导出的对比数据（后写覆盖）
    pub exported: BTreeMap<String, ExportedResult>,
    /// 服务商处理后的文本
    pub crawled_text: Option<String>,
    /// 写作反馈产生的标注
    pub editorial: Vec<Annotation>,
    #[serde(skip)]
    pub report: Option<Vec<u8>>,
    pub export_started: bool,
    pub export_completed_at: Option<DateTime<Utc>>,
    pub export_healthy: Option<bool>,
    pub export_error: Option<String>,
    pub summary: Option<ScanSummary>,
    pub credits: Option<i64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(scan_id: impl Into<String>, text: impl Into<String>, options: ScanOptions) -> Self {
        let now = Utc::now();
        Self {
            scan_id: scan_id.into(),
            status: ScanStatus::Queued,
            options,
            text: text.into(),
            new_results: Vec::new(),
            exported: BTreeMap::new(),
            crawled_text: None,
            editorial: Vec::new(),
            report: None,
            export_started: false,
            export_completed_at: None,
            export_healthy: None,
            export_error: None,
            summary: None,
            credits: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 状态迁移，不合法的迁移被忽略并返回 false
    pub fn transition(&mut self, next: ScanStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.touch();
        true
    }

    /// 导出标志的测试并置位
    ///
    /// 必须在持有记录锁时调用：首次调用返回本次要导出的结果 ID，
    /// 之后任何调用都返回 `None`。
    pub fn try_begin_export(&mut self, result_ids: Vec<String>) -> Option<Vec<String>> {
        if self.export_started {
            return None;
        }
        self.export_started = true;
        self.touch();
        Some(result_ids)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// 用于高亮的文本：优先处理后的文本
    pub fn highlight_text(&self) -> &str {
        self.crawled_text.as_deref().unwrap_or(&self.text)
    }

    pub fn export_completed(&self) -> bool {
        self.export_completed_at.is_some()
    }

    pub fn summarize(&self) -> RecordSummary {
        RecordSummary {
            scan_id: self.scan_id.clone(),
            status: self.status,
            created_at: self.created_at,
            new_result_count: self.new_results.len(),
            exported_count: self.exported.len(),
            export_started: self.export_started,
            export_completed: self.export_completed(),
            aggregated_score: self.summary.as_ref().and_then(|s| s.aggregated_score),
        }
    }
}

/// 列表接口返回的摘要投影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub scan_id: String,
    pub status: ScanStatus,
    pub created_at: DateTime<Utc>,
    pub new_result_count: usize,
    pub exported_count: usize,
    pub export_started: bool,
    pub export_completed: bool,
    pub aggregated_score: Option<f64>,
}
