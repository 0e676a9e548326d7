use serde::Serialize;

use crate::highlight::render::render_markup;
use crate::highlight::report::{line_report, statistics, HighlightStats, LineReport};
use crate::models::Annotation;

/// 片段：半开区间 `[start, end)` 以及在该区间上生效的标注
///
/// `annotations` 按激活顺序排列（起点相同时按输入顺序），
/// 其中的标注是裁剪后的副本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub annotations: Vec<Annotation>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 合成结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Composition {
    pub segments: Vec<Segment>,
    pub markup: String,
    pub lines: Vec<LineReport>,
    pub stats: HighlightStats,
}

/// 合成入口
///
/// 空文本是正常情况：没有片段，标记为空字符串，统计全为零。
pub fn compose(text: &str, annotations: &[Annotation]) -> Composition {
    let chars: Vec<char> = text.chars().collect();
    let clamped = clamp_annotations(annotations, chars.len());
    let segments = sweep(&clamped);

    Composition {
        markup: render_markup(&chars, &segments),
        lines: line_report(&chars, &segments),
        stats: statistics(&segments),
        segments,
    }
}

/// 裁剪到 `[0, text_len]`，丢弃长度不为正的标注
///
/// `start := max(0, start)`，`length := min(length, text_len - start)`。
pub fn clamp_annotations(annotations: &[Annotation], text_len: usize) -> Vec<Annotation> {
    let text_len = text_len as i64;
    annotations
        .iter()
        .filter_map(|a| {
            let start = a.start.max(0);
            let length = a.length.min(text_len - start);
            (length > 0).then(|| Annotation {
                start,
                length,
                ..a.clone()
            })
        })
        .collect()
}

/// 同一位置上结束事件排在开始事件之前，首尾相接的两个标注不会被合并
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Start,
}

/// 扫描线分段，输入必须是已裁剪的标注
pub fn sweep(annotations: &[Annotation]) -> Vec<Segment> {
    let mut events: Vec<(usize, EventKind, usize)> = Vec::with_capacity(annotations.len() * 2);
    for (idx, a) in annotations.iter().enumerate() {
        let start = a.start as usize;
        let end = (a.start + a.length) as usize;
        events.push((start, EventKind::Start, idx));
        events.push((end, EventKind::End, idx));
    }
    events.sort_unstable();

    let mut segments = Vec::new();
    let mut active: Vec<usize> = Vec::new();
    let mut boundary = 0usize;

    for (pos, kind, idx) in events {
        if pos > boundary && !active.is_empty() {
            segments.push(Segment {
                start: boundary,
                end: pos,
                annotations: active.iter().map(|&i| annotations[i].clone()).collect(),
            });
        }
        match kind {
            EventKind::Start => active.push(idx),
            EventKind::End => active.retain(|&i| i != idx),
        }
        boundary = pos;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn ann(start: i64, length: i64, category: Category) -> Annotation {
        Annotation::new(start, length, category)
    }

    fn ranges(segments: &[Segment]) -> Vec<(usize, usize)> {
        segments.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_clamp_rules() {
        let clamped = clamp_annotations(
            &[
                ann(-3, 5, Category::Grammar),  // 起点归零，长度不变 → [0, 5)
                ann(8, 10, Category::Style),    // → [8, 10)
                ann(10, 3, Category::Spelling), // 起点在末尾，丢弃
                ann(4, 0, Category::Identical), // 零长度，丢弃
                ann(2, -1, Category::Identical),
            ],
            10,
        );

        let spans: Vec<_> = clamped.iter().map(|a| (a.start, a.length)).collect();
        assert_eq!(spans, vec![(0, 5), (8, 2)]);
    }

    #[test]
    fn test_adjacent_annotations_not_fused() {
        let segments = sweep(&[ann(0, 4, Category::Grammar), ann(4, 4, Category::Style)]);

        assert_eq!(ranges(&segments), vec![(0, 4), (4, 8)]);
        assert_eq!(segments[0].annotations.len(), 1);
        assert_eq!(segments[1].annotations[0].category, Category::Style);
    }

    #[test]
    fn test_gap_is_implicit() {
        let segments = sweep(&[ann(0, 2, Category::Grammar), ann(5, 2, Category::Style)]);
        assert_eq!(ranges(&segments), vec![(0, 2), (5, 7)]);
    }

    #[test]
    fn test_activation_order_ties_by_input() {
        let segments = sweep(&[
            ann(0, 6, Category::Identical),
            ann(0, 3, Category::Spelling),
            ann(1, 1, Category::Grammar),
        ]);

        assert_eq!(ranges(&segments), vec![(0, 1), (1, 2), (2, 3), (3, 6)]);
        let order: Vec<_> = segments[1].annotations.iter().map(|a| a.category).collect();
        assert_eq!(
            order,
            vec![Category::Identical, Category::Spelling, Category::Grammar]
        );
    }

    #[test]
    fn test_input_not_mutated_and_multibyte_offsets() {
        let input = vec![ann(0, 2, Category::Identical), ann(-1, 100, Category::Style)];
        let snapshot = input.clone();

        let composition = compose("你好世界", &input);

        assert_eq!(input, snapshot);
        assert_eq!(ranges(&composition.segments), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_empty_text() {
        let composition = compose("", &[ann(0, 3, Category::Grammar)]);
        assert!(composition.segments.is_empty());
        assert_eq!(composition.markup, "");
        assert!(composition.lines.is_empty());
        assert_eq!(composition.stats, HighlightStats::default());
    }
}
