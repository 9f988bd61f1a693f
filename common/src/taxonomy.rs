//! 命名規則テーブル
//!
//! `{prefix}_{shortform}` の組み合わせからカテゴリへの対応表と、
//! カテゴリごとに許可されるファイル種別を管理する。
//! テーブルは起動時に確定し、実行中に変更されることはない。

use crate::category::Category;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// 組み込みの命名規則
const BUILTIN_ENTRIES: &[(&str, &str, Category)] = &[
    // General
    ("gen", "logo", Category::General),
    // Substation Condition
    ("sc", "substationoverview", Category::SubstationCondition),
    ("sc", "signboard", Category::SubstationCondition),
    ("sc", "switchgear", Category::SubstationCondition),
    ("sc", "switchgearnameplate", Category::SubstationCondition),
    ("sc", "transformer", Category::SubstationCondition),
    ("sc", "transformernameplate", Category::SubstationCondition),
    ("sc", "lvdb", Category::SubstationCondition),
    ("sc", "lvdbnameplate", Category::SubstationCondition),
    ("sc", "battery", Category::SubstationCondition),
    ("sc", "batterynameplate", Category::SubstationCondition),
    ("sc", "fireext", Category::SubstationCondition),
    ("sc", "efi", Category::SubstationCondition),
    ("sc", "sf6", Category::SubstationCondition),
    // Sticker
    ("stk", "normal", Category::Sticker),
    ("stk", "defect", Category::Sticker),
    // Visual Defect
    ("vi", "switchgear", Category::VisualDefect),
    ("vi", "cablepilc", Category::VisualDefect),
    ("vi", "ptx", Category::VisualDefect),
    ("vi", "ltx", Category::VisualDefect),
    ("vi", "lvdb", Category::VisualDefect),
    ("vi", "linkbox", Category::VisualDefect),
    ("vi", "efi", Category::VisualDefect),
    ("vi", "earthing", Category::VisualDefect),
    ("vi", "signboard", Category::VisualDefect),
    ("vi", "fireext", Category::VisualDefect),
    ("vi", "batterycharger", Category::VisualDefect),
    ("vi", "rubbermat", Category::VisualDefect),
    ("vi", "trenching", Category::VisualDefect),
    ("vi", "louver", Category::VisualDefect),
    ("vi", "exhaustfan", Category::VisualDefect),
    ("vi", "lighting", Category::VisualDefect),
    ("vi", "substation", Category::VisualDefect),
    ("vi", "aircond", Category::VisualDefect),
    ("vi", "hpole", Category::VisualDefect),
    ("vi", "firefighting", Category::VisualDefect),
    // Maintenance Info
    ("mi", "pmsticker", Category::MaintenanceInfo),
    ("mi", "rmsticker", Category::MaintenanceInfo),
    ("mi", "oltt", Category::MaintenanceInfo),
    // Test Sheet
    ("ts", "cbm", Category::TestSheet),
    ("ts", "vitest", Category::TestSheet),
];

/// 拡張子から判定したファイル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// .jpg / .jpeg / .png / .tif / .tiff
    Image,
    /// .pdf
    Document,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Image => write!(f, "image"),
            FileKind::Document => write!(f, "PDF document"),
        }
    }
}

/// カテゴリごとに許可されるファイル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllowedFileKind {
    ImageOnly,
    DocumentOnly,
}

impl AllowedFileKind {
    pub fn permits(&self, kind: FileKind) -> bool {
        matches!(
            (self, kind),
            (AllowedFileKind::ImageOnly, FileKind::Image)
                | (AllowedFileKind::DocumentOnly, FileKind::Document)
        )
    }

    /// 許可される側のファイル種別
    pub fn expected_kind(&self) -> FileKind {
        match self {
            AllowedFileKind::ImageOnly => FileKind::Image,
            AllowedFileKind::DocumentOnly => FileKind::Document,
        }
    }
}

/// 命名規則の1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub prefix: String,
    pub shortform: String,
    pub category: Category,
}

/// カスタムテーブルのJSON形式
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    entries: Vec<TaxonomyEntry>,
}

/// 命名規則テーブル
#[derive(Debug, Clone)]
pub struct TaxonomyTable {
    entries: Vec<TaxonomyEntry>,
    index: HashMap<(String, String), Category>,
}

impl TaxonomyTable {
    /// 組み込みテーブル（プロセス内で1度だけ構築）
    pub fn builtin() -> &'static TaxonomyTable {
        static TABLE: OnceLock<TaxonomyTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let entries = BUILTIN_ENTRIES
                .iter()
                .map(|(prefix, shortform, category)| TaxonomyEntry {
                    prefix: (*prefix).to_string(),
                    shortform: (*shortform).to_string(),
                    category: *category,
                })
                .collect();
            Self::index_entries(entries)
        })
    }

    /// エントリ列から構築（検証あり）
    ///
    /// キーは前後の空白を除いて小文字化する。
    /// 空のキー、`_` を含むキー、重複ペア、`Uncategorized` の値はエラー。
    pub fn from_entries(entries: Vec<TaxonomyEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidTaxonomy("table has no entries".into()));
        }

        let mut normalized = Vec::with_capacity(entries.len());
        for entry in entries {
            let prefix = entry.prefix.trim().to_lowercase();
            let shortform = entry.shortform.trim().to_lowercase();

            for key in [&prefix, &shortform] {
                if key.is_empty() {
                    return Err(Error::InvalidTaxonomy(format!(
                        "empty key in entry '{}_{}'",
                        prefix, shortform
                    )));
                }
                if key.contains('_') {
                    return Err(Error::InvalidTaxonomy(format!(
                        "key '{}' must not contain '_'",
                        key
                    )));
                }
            }

            if !entry.category.is_categorized() {
                return Err(Error::InvalidTaxonomy(format!(
                    "'{}_{}' maps to Uncategorized",
                    prefix, shortform
                )));
            }

            if normalized
                .iter()
                .any(|e: &TaxonomyEntry| e.prefix == prefix && e.shortform == shortform)
            {
                return Err(Error::InvalidTaxonomy(format!(
                    "duplicate pair '{}_{}'",
                    prefix, shortform
                )));
            }

            normalized.push(TaxonomyEntry {
                prefix,
                shortform,
                category: entry.category,
            });
        }

        Ok(Self::index_entries(normalized))
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TaxonomyFile = serde_json::from_str(json)?;
        Self::from_entries(file.entries)
    }

    /// JSONファイルから読み込み（非WASM環境のみ）
    #[cfg(not(feature = "wasm"))]
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn index_entries(entries: Vec<TaxonomyEntry>) -> Self {
        let index = entries
            .iter()
            .map(|e| ((e.prefix.clone(), e.shortform.clone()), e.category))
            .collect();
        Self { entries, index }
    }

    /// `(prefix, shortform)` からカテゴリを引く（大文字小文字は区別しない）
    pub fn lookup(&self, prefix: &str, shortform: &str) -> Option<Category> {
        self.index
            .get(&(prefix.to_lowercase(), shortform.to_lowercase()))
            .copied()
    }

    /// カテゴリに許可されるファイル種別
    ///
    /// `Uncategorized` には方針がないため `None`。
    pub fn allowed_file_kind(&self, category: Category) -> Option<AllowedFileKind> {
        match category {
            Category::Uncategorized => None,
            Category::TestSheet => Some(AllowedFileKind::DocumentOnly),
            _ => Some(AllowedFileKind::ImageOnly),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &TaxonomyEntry> {
        self.entries.iter()
    }

    /// カテゴリに属する shortform の一覧（テーブル順）
    pub fn shortforms(&self, category: Category) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.shortform.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TaxonomyTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}
