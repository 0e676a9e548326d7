//! 标注模型
//!
//! 一个标注就是原文上一段带类别的区间。偏移量按 Unicode 码点计算，
//! 不是字节，这样多字节文本（中文、emoji）下位置依然正确。

use serde::{Deserialize, Serialize};

/// 标注家族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationFamily {
    /// 写作类（语法、拼写、标点、风格）
    Editorial,
    /// 内容匹配类（相同、轻微改动、语义相近、其他匹配）
    ContentMatch,
}

/// 标注类别（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Grammar,
    Spelling,
    Punctuation,
    Style,
    Identical,
    MinorChange,
    RelatedMeaning,
    GenericMatch,
}

impl Category {
    pub fn family(self) -> AnnotationFamily {
        match self {
            Category::Grammar | Category::Spelling | Category::Punctuation | Category::Style => {
                AnnotationFamily::Editorial
            }
            Category::Identical
            | Category::MinorChange
            | Category::RelatedMeaning
            | Category::GenericMatch => AnnotationFamily::ContentMatch,
        }
    }

    /// 标准名称（与序列化结果一致）
    pub fn name(self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Spelling => "spelling",
            Category::Punctuation => "punctuation",
            Category::Style => "style",
            Category::Identical => "identical",
            Category::MinorChange => "minor-change",
            Category::RelatedMeaning => "related-meaning",
            Category::GenericMatch => "generic-match",
        }
    }

    /// 从写作反馈的类型字段解析（数字或字符串都可能出现）
    ///
    /// 无法识别的类型一律归为风格类。
    pub fn from_correction_type(value: &serde_json::Value) -> Self {
        if let Some(code) = value.as_i64() {
            return match code {
                1 => Category::Grammar,
                2 => Category::Spelling,
                3 => Category::Punctuation,
                _ => Category::Style,
            };
        }
        match value.as_str().map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("grammar") => Category::Grammar,
            Some("spelling") | Some("mechanics") => Category::Spelling,
            Some("punctuation") => Category::Punctuation,
            _ => Category::Style,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 标注的描述信息（不参与计算，只用于展示）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// 来源引用（匹配到的 URL、标题或结果 ID）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// 标注
///
/// 构造后不可变。`start` / `length` 用有符号整数保存服务商原始数据，
/// 越界或非正长度的标注在合成阶段被裁剪或丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: i64,
    pub length: i64,
    pub category: Category,
    #[serde(default)]
    pub meta: AnnotationMeta,
}

impl Annotation {
    pub fn new(start: i64, length: i64, category: Category) -> Self {
        Self {
            start,
            length,
            category,
            meta: AnnotationMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: AnnotationMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn family(&self) -> AnnotationFamily {
        self.category.family()
    }
}
