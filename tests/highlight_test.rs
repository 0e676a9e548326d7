use std::collections::HashSet;

use proptest::prelude::*;
use scan_highlight::highlight::{clamp_annotations, compose};
use scan_highlight::models::{Annotation, Category};

fn categories(segment: &scan_highlight::Segment) -> Vec<Category> {
    segment.annotations.iter().map(|a| a.category).collect()
}

#[test]
fn test_spelling_inside_identical_sentence() {
    let text = "The cat sat. The cat ran.";
    let annotations = vec![
        Annotation::new(4, 3, Category::Spelling),
        Annotation::new(0, 12, Category::Identical),
    ];

    let composition = compose(text, &annotations);

    let ranges: Vec<(usize, usize)> = composition.segments.iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 12)]);
    assert_eq!(categories(&composition.segments[0]), vec![Category::Identical]);
    assert_eq!(
        categories(&composition.segments[1]),
        vec![Category::Identical, Category::Spelling]
    );
    assert_eq!(categories(&composition.segments[2]), vec![Category::Identical]);

    assert_eq!(composition.stats.editorial_count, 1);
    assert_eq!(composition.stats.content_match_count, 1);
    assert_eq!(composition.stats.segment_count, 3);

    assert_eq!(composition.lines.len(), 1);
    let line = &composition.lines[0];
    assert_eq!(line.line, 1);
    assert_eq!((line.start, line.end), (0, text.chars().count()));
    assert_eq!(line.spans.len(), 3);

    assert!(composition.markup.ends_with(" The cat ran."));
    assert!(composition.markup.contains(r#"<mark class="hl hl-spelling""#));
}

#[test]
fn test_input_is_not_mutated() {
    let annotations = vec![
        Annotation::new(-3, 10, Category::Grammar),
        Annotation::new(2, 100, Category::Identical),
    ];
    let before = annotations.clone();

    let composition = compose("short text", &annotations);

    assert_eq!(annotations, before);
    assert_eq!(composition.segments.last().map(|s| s.end), Some(10));
}

#[test]
fn test_adjacent_annotations_touch_without_overlap() {
    let composition = compose(
        "aaaabbbb",
        &[
            Annotation::new(0, 4, Category::Identical),
            Annotation::new(4, 4, Category::MinorChange),
        ],
    );

    assert_eq!(composition.segments.len(), 2);
    assert_eq!(composition.segments[0].end, composition.segments[1].start);
    assert_eq!(composition.segments[0].annotations.len(), 1);
    assert_eq!(composition.segments[1].annotations.len(), 1);
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Grammar),
        Just(Category::Spelling),
        Just(Category::Punctuation),
        Just(Category::Style),
        Just(Category::Identical),
        Just(Category::MinorChange),
        Just(Category::RelatedMeaning),
        Just(Category::GenericMatch),
    ]
}

fn annotation_strategy() -> impl Strategy<Value = Annotation> {
    (-20i64..80, -10i64..60, category_strategy())
        .prop_map(|(start, length, category)| Annotation::new(start, length, category))
}

proptest! {
    #[test]
    fn prop_segments_sorted_and_disjoint(
        text in "[a-z \\n\\r é中]{0,60}",
        annotations in prop::collection::vec(annotation_strategy(), 0..12),
    ) {
        let len = text.chars().count();
        let composition = compose(&text, &annotations);

        for segment in &composition.segments {
            prop_assert!(segment.start < segment.end);
            prop_assert!(segment.end <= len);
            prop_assert!(!segment.annotations.is_empty());
        }
        for pair in composition.segments.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn prop_coverage_matches_clamped_annotations(
        text in "[a-z ]{0,50}",
        annotations in prop::collection::vec(annotation_strategy(), 0..10),
    ) {
        let len = text.chars().count();
        let clamped = clamp_annotations(&annotations, len);
        let composition = compose(&text, &annotations);

        for position in 0..len {
            let expected = clamped
                .iter()
                .filter(|a| (a.start as usize) <= position && position < (a.start + a.length) as usize)
                .count();
            let actual = composition
                .segments
                .iter()
                .find(|s| s.start <= position && position < s.end)
                .map(|s| s.annotations.len())
                .unwrap_or(0);
            prop_assert_eq!(expected, actual);
        }
    }

    #[test]
    fn prop_statistics_count_each_annotation_once(
        text in "[a-z ]{1,50}",
        annotations in prop::collection::vec(annotation_strategy(), 0..10),
    ) {
        let clamped = clamp_annotations(&annotations, text.chars().count());
        let distinct: HashSet<(Category, i64, i64)> =
            clamped.iter().map(|a| (a.category, a.start, a.length)).collect();

        let stats = compose(&text, &annotations).stats;

        prop_assert_eq!(stats.total_annotations, distinct.len());
        prop_assert_eq!(stats.editorial_count + stats.content_match_count, stats.total_annotations);
        prop_assert_eq!(stats.by_category.values().sum::<usize>(), distinct.len());
    }

    #[test]
    fn prop_line_spans_stay_inside_lines(
        text in "[ab\\n\\r]{0,40}",
        annotations in prop::collection::vec(annotation_strategy(), 0..8),
    ) {
        let composition = compose(&text, &annotations);
        for line in &composition.lines {
            prop_assert!(!line.spans.is_empty());
            for span in &line.spans {
                prop_assert!(span.start < span.end);
                prop_assert!(span.end <= line.end - line.start);
            }
        }
    }
}
