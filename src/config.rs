use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::clients::RetryPolicy;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 服务商 API 配置 ---
    pub provider_api_base_url: String,
    /// 为空时使用离线客户端
    pub provider_api_token: String,
    /// 回调地址前缀，导出请求会把服务商指向这里
    pub webhook_base_url: String,
    // --- 导出重试 ---
    pub export_max_attempts: u32,
    pub export_base_delay_ms: u64,
    /// 生产环境下不向直接调用方暴露内部错误细节
    pub production: bool,
    // --- 回放配置 ---
    /// 回放文件存放目录
    pub replay_folder: String,
    /// 高亮结果输出目录
    pub output_folder: String,
    /// 同时回放的扫描数量
    pub max_concurrent_replays: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_api_base_url: "https://api.copyleaks.com".to_string(),
            provider_api_token: String::new(),
            webhook_base_url: "http://localhost:8080/webhook".to_string(),
            export_max_attempts: 3,
            export_base_delay_ms: 1000,
            production: false,
            replay_folder: "replays".to_string(),
            output_folder: "highlight_output".to_string(),
            max_concurrent_replays: 8,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 文件配置 + 环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            provider_api_base_url: env_string("PROVIDER_API_BASE_URL", self.provider_api_base_url),
            provider_api_token: env_string("PROVIDER_API_TOKEN", self.provider_api_token),
            webhook_base_url: env_string("WEBHOOK_BASE_URL", self.webhook_base_url),
            export_max_attempts: env_parse("EXPORT_MAX_ATTEMPTS", self.export_max_attempts),
            export_base_delay_ms: env_parse("EXPORT_BASE_DELAY_MS", self.export_base_delay_ms),
            production: env_parse("PRODUCTION", self.production),
            replay_folder: env_string("REPLAY_FOLDER", self.replay_folder),
            output_folder: env_string("OUTPUT_FOLDER", self.output_folder),
            max_concurrent_replays: env_parse("MAX_CONCURRENT_REPLAYS", self.max_concurrent_replays),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    /// 导出请求的重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.export_max_attempts.max(1),
            base_delay: Duration::from_millis(self.export_base_delay_ms),
        }
    }
}

fn env_string(key: &str, fallback: String) -> String {
    std::env::var(key).unwrap_or(fallback)
}

/// 环境变量无法解析时保留原值
fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            webhook_base_url = "https://hooks.example.com/wh"
            export_max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.webhook_base_url, "https://hooks.example.com/wh");
        assert_eq!(config.export_max_attempts, 5);
        assert_eq!(config.export_base_delay_ms, 1000);
        assert_eq!(config.replay_folder, "replays");
    }

    #[test]
    fn test_retry_policy_never_zero_attempts() {
        let config = Config {
            export_max_attempts: 0,
            ..Config::default()
        };
        assert_eq!(config.retry_policy().max_attempts, 1);
        assert_eq!(Config::default().retry_policy().base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_unparsable_env_value_keeps_fallback() {
        std::env::set_var("SCAN_HIGHLIGHT_TEST_ATTEMPTS", "many");
        assert_eq!(env_parse("SCAN_HIGHLIGHT_TEST_ATTEMPTS", 3u32), 3);
        std::env::set_var("SCAN_HIGHLIGHT_TEST_ATTEMPTS", "5");
        assert_eq!(env_parse("SCAN_HIGHLIGHT_TEST_ATTEMPTS", 3u32), 5);
        std::env::remove_var("SCAN_HIGHLIGHT_TEST_ATTEMPTS");
        assert_eq!(env_string("SCAN_HIGHLIGHT_TEST_ATTEMPTS", "x".into()), "x");
    }
}
