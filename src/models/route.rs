//! 回调路由
//!
//! 导出请求告诉服务商把结果推到哪些地址，回调入口再把地址解析回来，
//! 两边共用这一个定义。

use crate::models::events::StatusKind;

/// 回调路由（相对于回调地址前缀）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookRoute {
    /// `{completed|error|creditsChecked}/{scanId}`
    Status { kind: StatusKind, scan_id: String },
    /// `new-result/{scanId}`
    NewResult { scan_id: String },
    /// `export/{scanId}/results/{resultId}`
    ExportedResult { scan_id: String, result_id: String },
    /// `export/{scanId}/crawled-version`
    CrawledVersion { scan_id: String },
    /// `export/{scanId}/pdf-report`
    PdfReport { scan_id: String },
    /// `export/{scanId}/completed`
    ExportCompleted { scan_id: String },
    /// `export/{scanId}/writing-feedback`
    WritingFeedback { scan_id: String },
}

impl WebhookRoute {
    /// 解析路由，忽略首尾斜杠；无法识别时返回 `None`
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            ["new-result", scan_id] => Some(WebhookRoute::NewResult {
                scan_id: scan_id.to_string(),
            }),
            ["export", scan_id, "results", result_id] => Some(WebhookRoute::ExportedResult {
                scan_id: scan_id.to_string(),
                result_id: result_id.to_string(),
            }),
            ["export", scan_id, "crawled-version"] => Some(WebhookRoute::CrawledVersion {
                scan_id: scan_id.to_string(),
            }),
            ["export", scan_id, "pdf-report"] => Some(WebhookRoute::PdfReport {
                scan_id: scan_id.to_string(),
            }),
            ["export", scan_id, "completed"] => Some(WebhookRoute::ExportCompleted {
                scan_id: scan_id.to_string(),
            }),
            ["export", scan_id, "writing-feedback"] => Some(WebhookRoute::WritingFeedback {
                scan_id: scan_id.to_string(),
            }),
            [status, scan_id] => StatusKind::from_route(status).map(|kind| WebhookRoute::Status {
                kind,
                scan_id: scan_id.to_string(),
            }),
            _ => None,
        }
    }

    pub fn scan_id(&self) -> &str {
        match self {
            WebhookRoute::Status { scan_id, .. }
            | WebhookRoute::NewResult { scan_id }
            | WebhookRoute::ExportedResult { scan_id, .. }
            | WebhookRoute::CrawledVersion { scan_id }
            | WebhookRoute::PdfReport { scan_id }
            | WebhookRoute::ExportCompleted { scan_id }
            | WebhookRoute::WritingFeedback { scan_id } => scan_id,
        }
    }

    /// 相对路径
    pub fn path(&self) -> String {
        match self {
            WebhookRoute::Status { kind, scan_id } => {
                let segment = match kind {
                    StatusKind::Completed => "completed",
                    StatusKind::Error => "error",
                    StatusKind::CreditsChecked => "creditsChecked",
                };
                format!("{}/{}", segment, scan_id)
            }
            WebhookRoute::NewResult { scan_id } => format!("new-result/{}", scan_id),
            WebhookRoute::ExportedResult { scan_id, result_id } => {
                format!("export/{}/results/{}", scan_id, result_id)
            }
            WebhookRoute::CrawledVersion { scan_id } => format!("export/{}/crawled-version", scan_id),
            WebhookRoute::PdfReport { scan_id } => format!("export/{}/pdf-report", scan_id),
            WebhookRoute::ExportCompleted { scan_id } => format!("export/{}/completed", scan_id),
            WebhookRoute::WritingFeedback { scan_id } => {
                format!("export/{}/writing-feedback", scan_id)
            }
        }
    }

    /// 拼接回调地址前缀
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.path())
    }

    /// 能否原样作为回调路径中的一段
    ///
    /// 含 `/`、`?`、`#`、`%` 或空白的 ID 拼进地址后无法被 `parse` 还原。
    pub fn is_safe_segment(segment: &str) -> bool {
        !segment.is_empty()
            && !segment
                .chars()
                .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    }

    /// 提交时使用的状态回调模板，`{STATUS}` 由服务商替换
    pub fn status_template(base: &str, scan_id: &str) -> String {
        format!("{}/{{STATUS}}/{}", base.trim_end_matches('/'), scan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_routes() {
        assert_eq!(
            WebhookRoute::parse("/completed/abc"),
            Some(WebhookRoute::Status {
                kind: StatusKind::Completed,
                scan_id: "abc".into()
            })
        );
        assert_eq!(
            WebhookRoute::parse("creditsChecked/abc"),
            Some(WebhookRoute::Status {
                kind: StatusKind::CreditsChecked,
                scan_id: "abc".into()
            })
        );
        assert_eq!(
            WebhookRoute::parse("export/abc/results/r-1/"),
            Some(WebhookRoute::ExportedResult {
                scan_id: "abc".into(),
                result_id: "r-1".into()
            })
        );
        assert_eq!(
            WebhookRoute::parse("export/abc/pdf-report"),
            Some(WebhookRoute::PdfReport { scan_id: "abc".into() })
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(WebhookRoute::parse("indexed/abc"), None);
        assert_eq!(WebhookRoute::parse("export/abc/unknown"), None);
        assert_eq!(WebhookRoute::parse(""), None);
    }

    #[test]
    fn test_path_roundtrip_for_export_routes() {
        let route = WebhookRoute::ExportCompleted { scan_id: "s1".into() };
        assert_eq!(route.url("https://h.example/wh/"), "https://h.example/wh/export/s1/completed");
        assert_eq!(WebhookRoute::parse(&route.path()), Some(route));
        assert_eq!(
            WebhookRoute::status_template("https://h.example/wh", "s1"),
            "https://h.example/wh/{STATUS}/s1"
        );
    }

    #[test]
    fn test_unsafe_segments_rejected() {
        assert!(WebhookRoute::is_safe_segment("r-1_abc.2"));
        for id in ["", "2a/b", "a?x=1", "a#b", "50%", "a b"] {
            assert!(!WebhookRoute::is_safe_segment(id), "{:?}", id);
        }

        let route = WebhookRoute::ExportedResult {
            scan_id: "s".into(),
            result_id: "r-1_abc.2".into(),
        };
        assert_eq!(WebhookRoute::parse(&route.path()), Some(route));
    }
}
