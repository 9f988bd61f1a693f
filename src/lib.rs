//! Substation Intake - 変電所点検写真の取り込みCLI

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod scanner;
pub mod storage;

use auth::ConfigAuth;
use config::Config;
use error::Result;
use storage::{DiskFileStore, JsonMetadataStore};
use substation_intake_common::{BatchPolicy, Classifier, IntakeService, TaxonomyTable};

/// CLIで使う受付サービスの型
pub type DiskIntakeService<'t> = IntakeService<'t, DiskFileStore, JsonMetadataStore, ConfigAuth>;

/// 設定からディスク上のストアを開いてサービスを組み立てる
pub fn open_service<'t>(config: &Config, table: &'t TaxonomyTable) -> Result<DiskIntakeService<'t>> {
    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::debug!("data directory: {}", data_dir.display());

    let files = DiskFileStore::open(&data_dir)?;
    let metadata = JsonMetadataStore::open(&data_dir)?;
    let auth = ConfigAuth::from_config(config);

    Ok(IntakeService::new(Classifier::new(table), files, metadata, auth).with_policy(BatchPolicy {
        allow_uncategorized: config.allow_uncategorized,
    }))
}
