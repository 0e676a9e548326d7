//! 从扫描记录中提取标注
//!
//! - 内容匹配类：来自每个导出结果的对比数据（identical / minorChanges / relatedMeaning）
//! - 写作类：来自写作反馈回调

use crate::models::events::{MatchGroup, WritingFeedbackPayload};
use crate::models::{Annotation, AnnotationMeta, Category, ExportedResult, ScanRecord};

/// 提取单个导出结果中的内容匹配标注
pub fn content_match_annotations(result: &ExportedResult) -> Vec<Annotation> {
    let source = result
        .url
        .clone()
        .or_else(|| result.title.clone())
        .unwrap_or_else(|| result.result_id.clone());

    let groups: [(Option<&MatchGroup>, Category); 3] = [
        (result.comparison.identical.as_ref(), Category::Identical),
        (result.comparison.minor_changes.as_ref(), Category::MinorChange),
        (result.comparison.related_meaning.as_ref(), Category::RelatedMeaning),
    ];

    groups
        .into_iter()
        .filter_map(|(group, category)| group.map(|g| (g, category)))
        .flat_map(|(group, category)| {
            let source = source.clone();
            let title = result.title.clone();
            group.source.chars.pairs().map(move |(start, length)| {
                Annotation::new(start, length, category).with_meta(AnnotationMeta {
                    message: title.clone(),
                    suggestion: None,
                    source: Some(source.clone()),
                })
            })
        })
        .collect()
}

/// 写作反馈负载 → 写作类标注
///
/// types / messages / suggestions 与 starts 按下标对应，缺失的部分留空。
pub fn editorial_annotations(payload: &WritingFeedbackPayload) -> Vec<Annotation> {
    let corrections = &payload.corrections;
    let chars = &corrections.text.chars;

    chars
        .starts
        .iter()
        .zip(chars.lengths.iter())
        .enumerate()
        .map(|(i, (&start, &length))| {
            let category = chars
                .types
                .get(i)
                .map(Category::from_correction_type)
                .unwrap_or(Category::Style);
            Annotation::new(start, length, category).with_meta(AnnotationMeta {
                message: corrections.messages.get(i).cloned(),
                suggestion: corrections.suggestions.get(i).cloned(),
                source: None,
            })
        })
        .collect()
}

/// 记录中的全部标注：先写作类，再按结果 ID 顺序的内容匹配类
pub fn record_annotations(record: &ScanRecord) -> Vec<Annotation> {
    let mut annotations = record.editorial.clone();
    for result in record.exported.values() {
        annotations.extend(content_match_annotations(result));
    }
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::{CharRanges, Comparison, MatchSide};
    use serde_json::json;

    fn group(starts: Vec<i64>, lengths: Vec<i64>) -> Option<MatchGroup> {
        Some(MatchGroup {
            source: MatchSide {
                chars: CharRanges { starts, lengths },
            },
        })
    }

    #[test]
    fn test_content_match_categories_and_source() {
        let result = ExportedResult {
            result_id: "r1".into(),
            url: None,
            title: Some("Some page".into()),
            comparison: Comparison {
                identical: group(vec![0, 10], vec![4, 2]),
                minor_changes: None,
                related_meaning: group(vec![20], vec![5]),
            },
        };

        let annotations = content_match_annotations(&result);
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].category, Category::Identical);
        assert_eq!(annotations[2].category, Category::RelatedMeaning);
        assert_eq!(annotations[2].start, 20);
        assert_eq!(annotations[0].meta.source.as_deref(), Some("Some page"));
    }

    #[test]
    fn test_editorial_from_feedback() {
        let payload: WritingFeedbackPayload = serde_json::from_value(json!({
            "corrections": {
                "text": {"chars": {"starts": [4, 9], "lengths": [3, 1], "types": [2]}},
                "messages": ["拼写错误"],
                "suggestions": ["cat"]
            }
        }))
        .unwrap();

        let annotations = editorial_annotations(&payload);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].category, Category::Spelling);
        assert_eq!(annotations[0].meta.suggestion.as_deref(), Some("cat"));
        assert_eq!(annotations[1].category, Category::Style);
        assert_eq!(annotations[1].meta.message, None);
    }
}
