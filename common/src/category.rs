//! 写真カテゴリ定義
//!
//! 点検写真は6つの業務カテゴリのいずれかに分類される。
//! 命名規則に合致しないファイルは `Uncategorized` になる。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 写真カテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "General")]
    General,
    #[serde(rename = "Substation Condition")]
    SubstationCondition,
    #[serde(rename = "Sticker")]
    Sticker,
    #[serde(rename = "Visual Defect")]
    VisualDefect,
    #[serde(rename = "Maintenance Info")]
    MaintenanceInfo,
    #[serde(rename = "Test Sheet")]
    TestSheet,
    #[serde(rename = "Uncategorized")]
    Uncategorized,
}

impl Category {
    /// 業務カテゴリ（ギャラリーのフィルタ順）
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::SubstationCondition,
        Category::Sticker,
        Category::VisualDefect,
        Category::MaintenanceInfo,
        Category::TestSheet,
    ];

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::SubstationCondition => "Substation Condition",
            Category::Sticker => "Sticker",
            Category::VisualDefect => "Visual Defect",
            Category::MaintenanceInfo => "Maintenance Info",
            Category::TestSheet => "Test Sheet",
            Category::Uncategorized => "Uncategorized",
        }
    }

    pub fn is_categorized(&self) -> bool {
        !matches!(self, Category::Uncategorized)
    }

    /// 全カテゴリ（`Uncategorized` を末尾に含む）
    pub fn with_fallback() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().chain(std::iter::once(Category::Uncategorized))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 空白・ハイフン・アンダースコアを除いた小文字表記
fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Category {
    type Err = String;

    /// "Test Sheet" / "test-sheet" / "testsheet" のいずれも受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = compact(s);
        Category::with_fallback()
            .find(|c| compact(c.label()) == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown category: {}. Use one of: {}",
                    s,
                    Category::ALL.map(|c| c.label()).join(", ")
                )
            })
    }
}

/// カテゴリの表示スタイル（バッジの配色トークン）
pub fn category_display_style(category: Category) -> &'static str {
    match category {
        Category::General => "bg-blue-100 text-blue-800",
        Category::SubstationCondition => "bg-green-100 text-green-800",
        Category::Sticker => "bg-yellow-100 text-yellow-800",
        Category::VisualDefect => "bg-red-100 text-red-800",
        Category::MaintenanceInfo => "bg-purple-100 text-purple-800",
        Category::TestSheet => "bg-orange-100 text-orange-800",
        Category::Uncategorized => "bg-gray-100 text-gray-800",
    }
}
