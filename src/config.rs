use crate::error::{IntakeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use substation_intake_common::TaxonomyTable;

/// 所有者IDを上書きする環境変数
pub const OWNER_ENV: &str = "INTAKE_OWNER";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub owner_id: Option<String>,
    /// ファイル本体とメタデータの保存先
    pub data_dir: Option<PathBuf>,
    /// カスタム命名規則（JSON）
    pub taxonomy_path: Option<PathBuf>,
    /// 命名規則に無いファイルも Uncategorized として受け付ける
    pub allow_uncategorized: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            tracing::debug!("config not found at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| IntakeError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("substation-intake").join("config.json"))
    }

    /// 保存先ディレクトリ（未設定ならOS標準のデータディレクトリ）
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| IntakeError::Config("data directory not found".into()))?;
        Ok(base.join("substation-intake"))
    }

    /// 所有者ID（環境変数を優先）
    pub fn owner_id(&self) -> Option<String> {
        if let Ok(owner) = std::env::var(OWNER_ENV) {
            if !owner.trim().is_empty() {
                return Some(owner.trim().to_string());
            }
        }
        self.owner_id.clone().filter(|o| !o.trim().is_empty())
    }

    pub fn set_owner(&mut self, owner: Option<String>) -> Result<()> {
        self.owner_id = owner;
        self.save()
    }

    /// 命名規則テーブルを読み込む
    pub fn taxonomy(&self) -> Result<TaxonomyTable> {
        match &self.taxonomy_path {
            Some(path) => {
                if !path.exists() {
                    return Err(IntakeError::FileNotFound(path.display().to_string()));
                }
                Ok(TaxonomyTable::from_file(path)?)
            }
            None => Ok(TaxonomyTable::builtin().clone()),
        }
    }
}
