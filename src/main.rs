use std::path::PathBuf;

use anyhow::Result;
use scan_highlight::utils::logging;
use scan_highlight::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（CONFIG_FILE 指定的 TOML 文件 + 环境变量覆盖）
    let config_path = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let _stats = App::initialize(config).await?.run().await?;

    Ok(())
}
