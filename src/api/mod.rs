//! API 模块
//!
//! 负责所有与外部调用方的交互：
//! - `webhook` - 服务商回调入口，始终确认
//! - `query` - 直接调用方的查询接口

pub mod query;
pub mod webhook;

// 重新导出常用类型
pub use query::{highlight_record, ApiResponse, QueryApi};
pub use webhook::{Ack, WebhookHandler};
