//! 服务商回调负载
//!
//! 只声明与状态相关的字段，其余字段由 serde 忽略。
//! scanId 由路由给出，负载里即使带了也不使用。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 状态回调类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusKind {
    Completed,
    Error,
    CreditsChecked,
}

impl StatusKind {
    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "completed" => Some(StatusKind::Completed),
            "error" => Some(StatusKind::Error),
            "creditsChecked" => Some(StatusKind::CreditsChecked),
            _ => None,
        }
    }
}

/// 状态回调负载
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    #[serde(default)]
    pub results: Option<StatusResults>,
    #[serde(default)]
    pub scanned_document: Option<ScannedDocument>,
    /// 可能是字符串，也可能是 `{code, message}` 对象
    #[serde(default)]
    pub error: Option<JsonValue>,
    #[serde(default)]
    pub credits: Option<JsonValue>,
}

impl StatusPayload {
    /// 本次完成回调里携带的结果 ID 列表
    pub fn result_ids(&self) -> Vec<String> {
        self.results
            .as_ref()
            .map(|r| r.internet.iter().map(|item| item.id.clone()).collect())
            .unwrap_or_default()
    }

    /// 错误描述，优先取 message 字段
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(JsonValue::String(s)) => s.clone(),
            Some(v) => v
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| v.to_string()),
            None => "服务商未提供错误信息".to_string(),
        }
    }

    /// 点数信息：优先顶层 credits，其次 scannedDocument.credits
    pub fn credits_value(&self) -> Option<i64> {
        self.credits
            .as_ref()
            .and_then(|v| v.as_i64().or_else(|| v.get("credits").and_then(|c| c.as_i64())))
            .or_else(|| self.scanned_document.as_ref().and_then(|d| d.credits))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResults {
    #[serde(default)]
    pub internet: Vec<ResultRef>,
    #[serde(default)]
    pub score: Option<ScoreInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInfo {
    #[serde(default)]
    pub aggregated_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedDocument {
    #[serde(default)]
    pub total_words: Option<u64>,
    #[serde(default)]
    pub credits: Option<i64>,
}

// ========== 导出结果 ==========

/// 字符区间列表（starts / lengths 一一对应）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharRanges {
    #[serde(default)]
    pub starts: Vec<i64>,
    #[serde(default)]
    pub lengths: Vec<i64>,
}

impl CharRanges {
    /// 成对遍历，长度不一致时以较短者为准
    pub fn pairs(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.starts.iter().copied().zip(self.lengths.iter().copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSide {
    #[serde(default)]
    pub chars: CharRanges,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    #[serde(default)]
    pub source: MatchSide,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    #[serde(default)]
    pub identical: Option<MatchGroup>,
    #[serde(default)]
    pub minor_changes: Option<MatchGroup>,
    #[serde(default)]
    pub related_meaning: Option<MatchGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportedText {
    #[serde(default)]
    pub comparison: Comparison,
}

/// 单个导出结果回调负载
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportedResultPayload {
    #[serde(default)]
    pub text: ExportedText,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

// ========== 导出完成 ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTask {
    #[serde(default)]
    pub is_healthy: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportCompletedPayload {
    #[serde(default)]
    pub tasks: Vec<ExportTask>,
    #[serde(default)]
    pub completed: bool,
}

impl ExportCompletedPayload {
    pub fn all_healthy(&self) -> bool {
        self.tasks.iter().all(|t| t.is_healthy)
    }
}

// ========== 写作反馈 ==========

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorrectionChars {
    #[serde(default)]
    pub starts: Vec<i64>,
    #[serde(default)]
    pub lengths: Vec<i64>,
    #[serde(default)]
    pub types: Vec<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorrectionText {
    #[serde(default)]
    pub chars: CorrectionChars,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Corrections {
    #[serde(default)]
    pub text: CorrectionText,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// 写作反馈回调负载
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WritingFeedbackPayload {
    #[serde(default)]
    pub corrections: Corrections,
}
