//! 服务商调用的有限重试

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::AppResult;

/// 指数退避重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 总尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待时间，之后每次翻倍
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的等待时间（`attempt` 从 1 开始）
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// 执行 `op`，只对可重试错误（429 / 5xx / 连接失败）进行重试
///
/// # 参数
/// - `policy`: 重试策略
/// - `operation`: 操作名称（仅用于日志）
/// - `op`: 每次尝试都会重新调用，生成新的 future
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} 失败 (尝试 {}/{}), {:?} 后重试: {}",
                    operation, attempt, policy.max_attempts, delay, e
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ProviderError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_exhausted() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = retry_with_backoff(&fast_policy(), "export", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::from_status("export", 503, "busy").into()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_aborts_immediately() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = retry_with_backoff(&fast_policy(), "export", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::from_status("export", 400, "bad").into()) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Provider(ref e)) if e.status == Some(400)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_rate_limit() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&fast_policy(), "export", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ProviderError::from_status("export", 429, "slow down").into())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        tokio_test::assert_ok!(&result);
        assert_eq!(result.unwrap(), 1);
    }
}
