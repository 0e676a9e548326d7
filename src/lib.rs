//! # Scan Highlight
//!
//! 对接抄袭检测服务商的扫描生命周期管理，以及原文高亮合成
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `store/` - 扫描记录存储，按记录加锁
//! - `clients/` - 服务商客户端（HTTP / 离线）与指数退避重试
//!
//! ### ② 业务能力层（Services）
//! - `ScanLifecycle` - 状态机：新建 → 提交 → 回调 → 导出（至多触发一次）
//! - `text_extract` / `annotation_extract` - 从回调负载中取出文本与标注
//!
//! ### ③ 高亮合成（Highlight）
//! - `compose` - 裁剪 → 扫描线 → 切分片段 → 渲染 → 统计 → 行报告
//!
//! ### ④ 边界与编排（API / Orchestration）
//! - `api::WebhookHandler` - 回调入口，始终确认
//! - `api::QueryApi` - 查询接口，错误映射为状态码
//! - `orchestrator::App` - 回放录制好的回调并输出高亮结果
//!
//! ## 模块结构

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod highlight;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;

// 重新导出常用类型
pub use api::{highlight_record, QueryApi, WebhookHandler};
pub use clients::{HttpProviderClient, OfflineProviderClient, ProviderClient};
pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind, ProviderError};
pub use highlight::{compose, Composition, Segment};
pub use models::{Annotation, Category, ScanRecord, ScanStatus};
pub use orchestrator::{App, ReplayStats};
pub use services::{EventOutcome, ScanLifecycle};
pub use store::{InMemoryRecordStore, RecordStore};
