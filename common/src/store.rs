//! 外部ストアとの境界
//!
//! ファイル本体・メタデータ・認証はそれぞれ別の実装に委ねる。
//! コアはここで定義するトレイト越しにのみ利用する。

use crate::category::Category;
use crate::error::Result;
use crate::record::{ImageRecord, NewImageRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 所有者ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ファイルストアが返す取得用ハンドル（中身は実装依存）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ファイル本体の保存先
pub trait FileStore {
    /// 保存してロケータを返す（容量超過は `Error::StorageQuota`）
    fn store(&mut self, owner: &OwnerId, bytes: &[u8], mime_type: &str) -> Result<Locator>;

    /// 表示用の参照（URL等）
    fn retrieve_url(&self, locator: &Locator) -> Result<String>;

    /// 削除（存在しなければ `Error::NotFound`）
    fn remove(&mut self, locator: &Locator) -> Result<()>;
}

/// メタデータの保存先
pub trait MetadataStore {
    /// 一括挿入（id と作成日時はストアが付与）
    fn insert_many(&mut self, records: Vec<NewImageRecord>) -> Result<Vec<ImageRecord>>;

    /// 所有者のレコード一覧（登録順）
    fn list_by_owner(&self, owner: &OwnerId, category: Option<Category>) -> Result<Vec<ImageRecord>>;

    fn get(&self, id: &str) -> Result<ImageRecord>;

    /// 削除したレコードを返す（存在しなければ `Error::NotFound`）
    fn delete_by_id(&mut self, id: &str) -> Result<ImageRecord>;

    /// カテゴリ単位で削除し、件数を返す
    fn delete_by_category(&mut self, owner: &OwnerId, category: Category) -> Result<usize>;
}

/// 認証プロバイダ
pub trait AuthProvider {
    /// サインイン中の所有者（未サインインなら `Error::Unauthenticated`）
    fn current_owner_id(&self) -> Result<OwnerId>;
}

/// MIMEタイプから保存用の拡張子を決める
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.trim().to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/tiff" | "image/tif" => "tif",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// 拡張子からMIMEタイプを推定する（申告がない場合の補完用）
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => "",
    }
}
