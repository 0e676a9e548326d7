use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::api::{highlight_record, WebhookHandler};
use crate::clients::{HttpProviderClient, OfflineProviderClient, ProviderClient};
use crate::config::Config;
use crate::error::AppError;
use crate::highlight::HighlightStats;
use crate::models::{load_all_replays, ReplayFixture};
use crate::services::ScanLifecycle;
use crate::store::InMemoryRecordStore;
use crate::utils::logging::{log_startup, print_final_stats};

/// 回放统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub success: usize,
    pub pending: usize,
    pub failed: usize,
    pub total: usize,
}

/// 单个回放的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// 已生成高亮
    Highlighted(HighlightStats),
    /// 回调里没有导出的对比数据
    NotReady,
}

/// 应用主结构
pub struct App {
    config: Config,
    lifecycle: Arc<ScanLifecycle>,
    webhooks: Arc<WebhookHandler>,
}

impl App {
    /// 初始化应用，根据是否配置了令牌选择服务商客户端
    pub async fn initialize(config: Config) -> Result<Self> {
        let offline = config.provider_api_token.is_empty();
        let client: Arc<dyn ProviderClient> = if offline {
            Arc::new(OfflineProviderClient)
        } else {
            Arc::new(HttpProviderClient::new(&config))
        };

        log_startup(config.max_concurrent_replays, offline);

        Self::with_client(config, client).await
    }

    /// 使用指定客户端初始化
    pub async fn with_client(config: Config, client: Arc<dyn ProviderClient>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.output_folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", config.output_folder))?;

        let lifecycle = Arc::new(ScanLifecycle::new(
            Arc::new(InMemoryRecordStore::new()),
            client,
            &config,
        ));
        let webhooks = Arc::new(WebhookHandler::new(lifecycle.clone()));

        Ok(Self {
            config,
            lifecycle,
            webhooks,
        })
    }

    pub fn lifecycle(&self) -> &Arc<ScanLifecycle> {
        &self.lifecycle
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ReplayStats> {
        info!("\n📁 正在扫描回放文件...");
        let fixtures = load_all_replays(&self.config.replay_folder).await?;

        if fixtures.is_empty() {
            warn!("⚠️ 没有找到回放文件，程序结束");
            return Ok(ReplayStats::default());
        }

        info!("✓ 找到 {} 个回放文件", fixtures.len());
        let stats = self.replay_all(fixtures).await;

        print_final_stats(stats.success, stats.pending, stats.failed, &self.config.output_folder);
        Ok(stats)
    }

    async fn replay_all(&self, fixtures: Vec<ReplayFixture>) -> ReplayStats {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_replays.max(1)));
        let mut stats = ReplayStats {
            total: fixtures.len(),
            ..Default::default()
        };

        let handles: Vec<_> = fixtures
            .into_iter()
            .enumerate()
            .map(|(idx, fixture)| {
                let semaphore = semaphore.clone();
                let lifecycle = self.lifecycle.clone();
                let webhooks = self.webhooks.clone();
                let output_folder = self.config.output_folder.clone();

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await?;
                    replay_single(&lifecycle, &webhooks, fixture, &output_folder, idx + 1).await
                })
            })
            .collect();

        for (idx, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(Ok(ReplayOutcome::Highlighted(_))) => stats.success += 1,
                Ok(Ok(ReplayOutcome::NotReady)) => stats.pending += 1,
                Ok(Err(e)) => {
                    error!("[回放 {}] ❌ 处理过程中发生错误: {:#}", idx + 1, e);
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("[回放 {}] 任务执行失败: {}", idx + 1, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// 回放单个文件：新建 → 提交 → 依次投递回调 → 合成高亮 → 写出结果
///
/// 路由里的 `{scanId}` 会被替换为实际的扫描 ID。
pub async fn replay_single(
    lifecycle: &ScanLifecycle,
    webhooks: &WebhookHandler,
    fixture: ReplayFixture,
    output_folder: &str,
    index: usize,
) -> Result<ReplayOutcome> {
    let record = lifecycle.create(&fixture.text, fixture.options())?;
    let scan_id = record.scan_id;
    info!("[回放 {}] 扫描 {}，{} 条回调", index, scan_id, fixture.events.len());

    lifecycle.submit(&scan_id).await?;

    for event in &fixture.events {
        let route = event.route.replace("{scanId}", &scan_id);
        webhooks.handle(&route, &event.body_bytes()?).await;
    }

    let record = lifecycle.get(&scan_id)?;
    let composition = match highlight_record(&record) {
        Ok(composition) => composition,
        Err(AppError::Conflict(message)) => {
            warn!("[回放 {}] ⏳ {}", index, message);
            return Ok(ReplayOutcome::NotReady);
        }
        Err(e) => return Err(e.into()),
    };

    let folder = Path::new(output_folder);
    let markup_path = folder.join(format!("{}.html", scan_id));
    tokio::fs::write(&markup_path, &composition.markup)
        .await
        .with_context(|| format!("无法写入: {}", markup_path.display()))?;

    let report_path = folder.join(format!("{}.json", scan_id));
    let report = serde_json::to_vec_pretty(&serde_json::json!({
        "scanId": scan_id,
        "status": record.status,
        "stats": composition.stats,
        "lines": composition.lines,
    }))?;
    tokio::fs::write(&report_path, report)
        .await
        .with_context(|| format!("无法写入: {}", report_path.display()))?;

    info!(
        "[回放 {}] ✓ {} 个片段，写作类 {} / 匹配类 {}",
        index,
        composition.stats.segment_count,
        composition.stats.editorial_count,
        composition.stats.content_match_count
    );

    Ok(ReplayOutcome::Highlighted(composition.stats))
}
