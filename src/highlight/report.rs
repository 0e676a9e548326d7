//! 行报告与统计

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::highlight::compositor::Segment;
use crate::models::{Annotation, AnnotationFamily, Category};

/// 行内的一段高亮（行内偏移）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
    pub annotations: Vec<Annotation>,
}

/// 单行报告，只为至少有一段高亮的行生成
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    /// 行号，从 1 开始
    pub line: usize,
    /// 行在全文中的起止码点偏移（不含换行符）
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub spans: Vec<LineSpan>,
}

/// 去重统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightStats {
    pub segment_count: usize,
    pub editorial_count: usize,
    pub content_match_count: usize,
    pub total_annotations: usize,
    pub by_category: BTreeMap<Category, usize>,
}

/// 按 `\n`、`\r\n`、`\r` 切分行，返回码点区间（不含换行符）
fn line_ranges(chars: &[char]) -> Vec<(usize, usize)> {
    let mut lines = Vec::new();
    if chars.is_empty() {
        return lines;
    }

    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\n' => {
                lines.push((start, i));
                i += 1;
                start = i;
            }
            '\r' => {
                lines.push((start, i));
                i += if chars.get(i + 1) == Some(&'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push((start, chars.len()));
    lines
}

/// 行报告
///
/// 每个片段与每一行求交并裁剪成行内偏移，没有交集的行不出现在结果里。
pub fn line_report(chars: &[char], segments: &[Segment]) -> Vec<LineReport> {
    let mut reports = Vec::new();
    let mut first = 0;

    for (line_idx, (line_start, line_end)) in line_ranges(chars).into_iter().enumerate() {
        // 片段有序且不重叠，已经完全在本行之前的不必再看
        while first < segments.len() && segments[first].end <= line_start {
            first += 1;
        }

        let spans: Vec<LineSpan> = segments[first..]
            .iter()
            .take_while(|s| s.start < line_end)
            .filter_map(|s| {
                let from = s.start.max(line_start);
                let to = s.end.min(line_end);
                (from < to).then(|| LineSpan {
                    start: from - line_start,
                    end: to - line_start,
                    annotations: s.annotations.clone(),
                })
            })
            .collect();

        if !spans.is_empty() {
            reports.push(LineReport {
                line: line_idx + 1,
                start: line_start,
                end: line_end,
                text: chars[line_start..line_end].iter().collect(),
                spans,
            });
        }
    }

    reports
}

/// 统计
///
/// 按来源标注去重（类别 + 起点 + 长度），被邻居切成多段的标注只算一次。
pub fn statistics(segments: &[Segment]) -> HighlightStats {
    let mut seen: HashSet<(Category, i64, i64)> = HashSet::new();
    let mut stats = HighlightStats {
        segment_count: segments.len(),
        ..HighlightStats::default()
    };

    for annotation in segments.iter().flat_map(|s| s.annotations.iter()) {
        if !seen.insert((annotation.category, annotation.start, annotation.length)) {
            continue;
        }
        match annotation.family() {
            AnnotationFamily::Editorial => stats.editorial_count += 1,
            AnnotationFamily::ContentMatch => stats.content_match_count += 1,
        }
        *stats.by_category.entry(annotation.category).or_insert(0) += 1;
    }
    stats.total_annotations = stats.editorial_count + stats.content_match_count;

    stats
}
