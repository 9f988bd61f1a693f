//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("Not signed in: uploads and deletions require an authenticated owner")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage quota exceeded: {0}")]
    StorageQuota(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
