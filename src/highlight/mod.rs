//! 高亮合成
//!
//! 纯函数：(文本, 标注) → (互不重叠的片段, 标记字符串, 行报告, 去重统计)。
//! 输入被复制后处理，不修改调用方的标注列表；相同输入总是得到相同输出。
//!
//! 步骤：裁剪 → 扫描线 → 分段 → 渲染。

pub mod compositor;
pub mod render;
pub mod report;

pub use compositor::{clamp_annotations, compose, sweep, Composition, Segment};
pub use render::{class_name, escape_html, render_markup};
pub use report::{line_report, statistics, HighlightStats, LineReport, LineSpan};
