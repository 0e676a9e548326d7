//! 回放文件加载
//!
//! 一个回放文件记录了一次扫描收到的全部回调，格式：
//!
//! ```json
//! {
//!   "scan_id": "demo-1",
//!   "text": "原文",
//!   "events": [
//!     { "route": "completed/demo-1", "body": { ... } },
//!     { "route": "export/demo-1/results/r1", "body": { ... } }
//!   ]
//! }
//! ```
//!
//! 路由中可以写 `{scanId}` 占位，回放时替换为实际的扫描 ID（未指定 `scan_id` 时会生成）。

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::record::ScanOptions;

/// 一条录制下来的回调
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayEvent {
    /// 回调路由（不含回调地址前缀）
    pub route: String,
    /// 回调正文；字符串按原始字节投递（PDF 报告等）
    #[serde(default)]
    pub body: JsonValue,
}

impl ReplayEvent {
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            JsonValue::String(s) => Ok(s.as_bytes().to_vec()),
            other => Ok(serde_json::to_vec(other)?),
        }
    }
}

/// 回放文件
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFixture {
    #[serde(default)]
    pub scan_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl ReplayFixture {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            scan_id: self.scan_id.clone(),
            sandbox: self.sandbox,
            filename: self
                .file_path
                .as_deref()
                .and_then(|p| Path::new(p).file_stem())
                .map(|s| format!("{}.txt", s.to_string_lossy())),
        }
    }
}

/// 加载单个回放文件
pub async fn load_replay(path: &Path) -> Result<ReplayFixture> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取回放文件: {}", path.display()))?;

    let mut fixture: ReplayFixture = serde_json::from_str(&content)
        .with_context(|| format!("无法解析回放文件: {}", path.display()))?;

    fixture.file_path = Some(path.to_string_lossy().to_string());

    Ok(fixture)
}

/// 加载文件夹中所有 `.json` 回放文件，按文件名排序
///
/// 单个文件解析失败只记录警告，不影响其他文件。
pub async fn load_all_replays(folder_path: &str) -> Result<Vec<ReplayFixture>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut fixtures = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_replay(&path).await {
            Ok(fixture) => {
                tracing::info!("成功加载 {} 条回调", fixture.events.len());
                fixtures.push(fixture);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(fixtures)
}
