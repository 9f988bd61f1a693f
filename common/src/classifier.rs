//! ファイル名パーサー・分類器
//!
//! `{prefix}_{shortform}_[location]_[date]_[sequence].ext` 形式のファイル名を
//! 解析してカテゴリを判定する。I/Oは一切行わない。

use crate::category::Category;
use crate::taxonomy::{AllowedFileKind, FileKind, TaxonomyTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 受け付ける拡張子（小文字化後に末尾一致で判定）
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".tif", ".tiff"];
const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf"];

/// ファイル名の解析結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFilename {
    pub category: Category,
    pub item_type: String,
    pub location: String,
    pub date_taken: String,
    pub sequence: String,
    pub prefix: String,
}

/// 命名形式の不備
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedName {
    /// `_` 区切りのトークンが2つ未満
    TooFewTokens,
    /// prefix または shortform が空（`_ptx.jpg` など）
    EmptyToken,
    /// 対応する拡張子がない
    UnrecognizedExtension,
}

/// 重複の検出元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateScope {
    /// 登録済みファイルと重複
    Existing,
    /// 同じバッチ内の先行ファイルと重複
    Batch,
}

/// 候補ファイルの却下理由
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    #[error("{}", malformed_message(.0))]
    MalformedName(MalformedName),

    #[error("Unknown naming combination '{prefix}_{shortform}' (not in the naming taxonomy)")]
    UnknownCategory { prefix: String, shortform: String },

    #[error("{}", mismatch_message(.category, .expected, .found))]
    FileKindMismatch {
        category: Category,
        expected: AllowedFileKind,
        found: FileKind,
    },

    #[error("{}", duplicate_message(.0))]
    DuplicateFilename(DuplicateScope),

    #[error("Invalid file type '{0}' (only images and PDF documents are accepted)")]
    UnsupportedMimeType(String),
}

fn malformed_message(kind: &MalformedName) -> &'static str {
    match kind {
        MalformedName::TooFewTokens => "Invalid naming format (must follow {prefix}_{shortform})",
        MalformedName::EmptyToken => "Invalid naming format (prefix and shortform must not be empty)",
        MalformedName::UnrecognizedExtension => {
            "Unsupported file extension (use .jpg, .jpeg, .png, .tif, .tiff or .pdf)"
        }
    }
}

fn mismatch_message(category: &Category, expected: &AllowedFileKind, found: &FileKind) -> String {
    match expected {
        AllowedFileKind::DocumentOnly => format!(
            "{} files must be PDF documents, got an {}",
            category, found
        ),
        AllowedFileKind::ImageOnly => format!(
            "{} files must be images (jpg, png, tif), got a {}",
            category, found
        ),
    }
}

fn duplicate_message(scope: &DuplicateScope) -> &'static str {
    match scope {
        DuplicateScope::Existing => "File with this name already exists",
        DuplicateScope::Batch => "Duplicate of an earlier file in this upload",
    }
}

/// 拡張子からファイル種別を判定（大文字小文字は区別しない）
pub fn detect_file_kind(filename: &str) -> Option<FileKind> {
    let lower = filename.to_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Some(FileKind::Image)
    } else if DOCUMENT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Some(FileKind::Document)
    } else {
        None
    }
}

/// 小文字化・拡張子除去・`_` 分割
fn tokenize(filename: &str) -> Vec<String> {
    let lower = filename.to_lowercase();
    let stem = IMAGE_EXTENSIONS
        .iter()
        .chain(DOCUMENT_EXTENSIONS)
        .find_map(|ext| lower.strip_suffix(ext))
        .unwrap_or(lower.as_str());

    stem.split('_').map(str::to_string).collect()
}

/// テーブルを参照する分類器
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'t> {
    table: &'t TaxonomyTable,
}

impl Default for Classifier<'static> {
    fn default() -> Self {
        Self::new(TaxonomyTable::builtin())
    }
}

impl<'t> Classifier<'t> {
    pub fn new(table: &'t TaxonomyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t TaxonomyTable {
        self.table
    }

    /// `{prefix}_{shortform}` がテーブルに存在するか
    ///
    /// 3番目以降のトークンは判定に影響しない。拡張子の有無も問わない。
    pub fn is_valid_naming_format(&self, filename: &str) -> bool {
        let tokens = tokenize(filename);
        if tokens.len() < 2 {
            return false;
        }
        self.table.lookup(&tokens[0], &tokens[1]).is_some()
    }

    /// ファイル名を解析（失敗しない）
    ///
    /// 命名規則に合わない場合は `Uncategorized` を返す。
    /// 欠けている位置のフィールドは空文字列になる。
    pub fn parse_image_filename(&self, filename: &str) -> ParsedFilename {
        let mut tokens = tokenize(filename).into_iter();
        let mut next = || tokens.next().unwrap_or_default();

        let prefix = next();
        let item_type = next();
        let location = next();
        let date_taken = next();
        let sequence = next();

        let category = self
            .table
            .lookup(&prefix, &item_type)
            .unwrap_or(Category::Uncategorized);

        ParsedFilename {
            category,
            item_type,
            location,
            date_taken,
            sequence,
            prefix,
        }
    }

    /// ファイル種別の方針チェック（却下理由付き）
    pub fn check_file_type(&self, filename: &str) -> Result<(ParsedFilename, FileKind), RejectionReason> {
        let kind = detect_file_kind(filename)
            .ok_or(RejectionReason::MalformedName(MalformedName::UnrecognizedExtension))?;

        let tokens = tokenize(filename);
        if tokens.len() < 2 {
            return Err(RejectionReason::MalformedName(MalformedName::TooFewTokens));
        }
        if tokens[0].is_empty() || tokens[1].is_empty() {
            return Err(RejectionReason::MalformedName(MalformedName::EmptyToken));
        }

        let parsed = self.parse_image_filename(filename);
        let allowed = self.table.allowed_file_kind(parsed.category).ok_or_else(|| {
            RejectionReason::UnknownCategory {
                prefix: parsed.prefix.clone(),
                shortform: parsed.item_type.clone(),
            }
        })?;

        if !allowed.permits(kind) {
            return Err(RejectionReason::FileKindMismatch {
                category: parsed.category,
                expected: allowed,
                found: kind,
            });
        }

        Ok((parsed, kind))
    }

    /// 命名規則とファイル種別の両方を満たすか
    pub fn is_valid_file_type(&self, filename: &str) -> bool {
        self.check_file_type(filename).is_ok()
    }
}

/// 組み込みテーブルで命名形式を判定
pub fn is_valid_naming_format(filename: &str) -> bool {
    Classifier::default().is_valid_naming_format(filename)
}

/// 組み込みテーブルでファイル名を解析
pub fn parse_image_filename(filename: &str) -> ParsedFilename {
    Classifier::default().parse_image_filename(filename)
}

/// 組み込みテーブルでファイル種別を判定
pub fn is_valid_file_type(filename: &str) -> bool {
    Classifier::default().is_valid_file_type(filename)
}

/// item type の表示用整形
///
/// 大文字の前に空白を入れ、先頭を大文字にする（"cablePilc" → "Cable Pilc"）。
pub fn format_item_type(item_type: &str) -> String {
    let mut spaced = String::with_capacity(item_type.len() + 4);
    for c in item_type.chars() {
        if c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }

    let mut chars = spaced.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    capitalized.trim().to_string()
}
