//! 标记渲染
//!
//! 每个片段按激活顺序从外到内嵌套 `<mark>`：最先激活的标注在最外层，
//! 最后激活的标注在最内层。嵌套结构属于输出约定的一部分，不随输入顺序以外的因素变化。

use phf::phf_map;

use crate::highlight::compositor::Segment;
use crate::models::{Annotation, AnnotationFamily, Category};

/// 内容匹配子类型 → CSS 类名，未列出的子类型使用通用的 `match`
static MATCH_CLASSES: phf::Map<&'static str, &'static str> = phf_map! {
    "identical" => "match-identical",
    "minor-change" => "match-minor",
    "related-meaning" => "match-related",
};

/// 类别对应的 CSS 类名
///
/// 写作类与类别同名；内容匹配类查表，查不到时回退到 `match`。
pub fn class_name(category: Category) -> &'static str {
    match category.family() {
        AnnotationFamily::Editorial => category.name(),
        AnnotationFamily::ContentMatch => MATCH_CLASSES
            .get(category.name())
            .copied()
            .unwrap_or("match"),
    }
}

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_chars(chars: &[char]) -> String {
    escape_html(&chars.iter().collect::<String>())
}

fn open_tag(annotation: &Annotation) -> String {
    let mut tag = format!(
        r#"<mark class="hl hl-{}" data-category="{}" data-start="{}" data-length="{}""#,
        class_name(annotation.category),
        annotation.category.name(),
        annotation.start,
        annotation.length
    );
    let attrs = [
        ("data-message", annotation.meta.message.as_deref()),
        ("data-suggestion", annotation.meta.suggestion.as_deref()),
        ("data-source", annotation.meta.source.as_deref()),
    ];
    for (name, value) in attrs {
        if let Some(value) = value {
            tag.push_str(&format!(r#" {}="{}""#, name, escape_html(value)));
        }
    }
    tag.push('>');
    tag
}

/// 渲染整段文本
///
/// 片段之间的空隙原样转义输出。
pub fn render_markup(chars: &[char], segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut cursor = 0;

    for segment in segments {
        if segment.start > cursor {
            out.push_str(&escape_chars(&chars[cursor..segment.start]));
        }
        for annotation in &segment.annotations {
            out.push_str(&open_tag(annotation));
        }
        out.push_str(&escape_chars(&chars[segment.start..segment.end]));
        for _ in &segment.annotations {
            out.push_str("</mark>");
        }
        cursor = segment.end;
    }

    if cursor < chars.len() {
        out.push_str(&escape_chars(&chars[cursor..]));
    }
    out
}
