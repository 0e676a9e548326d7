//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把录制好的服务商回调按文件回放，驱动整条链路并输出高亮结果。
//!
//! ### `replay_processor` - 回放处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载回放文件（Vec<ReplayFixture>）
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! replay_processor (处理 Vec<ReplayFixture>)
//!     ↓
//! api::WebhookHandler (回调边界，始终确认)
//!     ↓
//! services::ScanLifecycle (状态机 + 导出触发)
//!     ↓
//! store / clients (基础设施：记录存储、服务商客户端)
//! ```
//!
//! 高亮合成（`highlight`）是纯函数，在回放结束后对完成的记录调用。

pub mod replay_processor;

// 重新导出主要类型
pub use replay_processor::{replay_single, App, ReplayOutcome, ReplayStats};
