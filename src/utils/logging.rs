/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`，详细模式下为 `debug`。
/// 重复调用不会报错（测试里多次初始化是常态）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发数
/// - `offline`: 是否使用离线客户端
pub fn log_startup(max_concurrent: usize, offline: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 回调回放模式");
    info!("📊 最大并发数: {}", max_concurrent);
    if offline {
        info!("🔌 未配置服务商令牌，使用离线客户端");
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `pending`: 导出数据未到齐的数量
/// - `failed`: 失败数量
/// - `output_folder`: 输出目录
pub fn print_final_stats(success: usize, pending: usize, failed: usize, output_folder: &str) {
    let total = success + pending + failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部回放完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("⏳ 未就绪: {}", pending);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n高亮结果已保存至: {}", output_folder);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
