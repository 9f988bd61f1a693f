//! 登録済みファイルのメタデータ

use crate::category::Category;
use crate::classifier::ParsedFilename;
use crate::store::{Locator, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// メタデータストアに保存されるレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub filename: String,
    /// ファイルストアのロケータ
    pub storage_path: Locator,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_by: OwnerId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sort_order: u32,
    pub category: Category,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub date_taken: String,
    #[serde(default)]
    pub sequence: String,
}

/// 挿入前のレコード（id と created_at はストアが付与する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImageRecord {
    pub filename: String,
    pub storage_path: Locator,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_by: OwnerId,
    pub sort_order: u32,
    pub category: Category,
    pub item_type: String,
    pub location: String,
    pub date_taken: String,
    pub sequence: String,
}

impl NewImageRecord {
    /// 解析結果とストレージ情報からレコードを組み立てる
    pub fn from_parsed(
        filename: impl Into<String>,
        parsed: ParsedFilename,
        storage_path: Locator,
        file_size: u64,
        mime_type: impl Into<String>,
        uploaded_by: OwnerId,
    ) -> Self {
        Self {
            filename: filename.into(),
            storage_path,
            file_size,
            mime_type: mime_type.into(),
            uploaded_by,
            sort_order: 0,
            category: parsed.category,
            item_type: parsed.item_type,
            location: parsed.location,
            date_taken: parsed.date_taken,
            sequence: parsed.sequence,
        }
    }

    /// ストアが採番した id と作成日時を付けて確定する
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> ImageRecord {
        ImageRecord {
            id,
            filename: self.filename,
            storage_path: self.storage_path,
            file_size: self.file_size,
            mime_type: self.mime_type,
            uploaded_by: self.uploaded_by,
            created_at,
            sort_order: self.sort_order,
            category: self.category,
            item_type: self.item_type,
            location: self.location,
            date_taken: self.date_taken,
            sequence: self.sequence,
        }
    }
}
