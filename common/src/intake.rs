//! アップロード受付サービス
//!
//! 認証 → 一括検証 → ファイル保存 → メタデータ登録 の流れを1箇所にまとめる。
//! 保存先の実装には依存しない。

use crate::batch::{BatchPolicy, RejectedCandidate, UploadCandidate};
use crate::category::Category;
use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::gallery::GalleryFilter;
use crate::record::{ImageRecord, NewImageRecord};
use crate::store::{mime_for_file_name, AuthProvider, FileStore, Locator, MetadataStore, OwnerId};
use tracing::{debug, info, warn};

/// アップロードするファイル（候補情報と本体）
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub candidate: UploadCandidate,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            candidate: UploadCandidate::new(file_name, mime_type, size),
            bytes,
        }
    }
}

/// 保存に失敗したファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub file_name: String,
    pub error: String,
}

/// アップロード結果
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub inserted: Vec<ImageRecord>,
    pub rejected: Vec<RejectedCandidate>,
    pub failed: Vec<FailedUpload>,
}

/// 受付サービス
pub struct IntakeService<'t, F, M, A> {
    classifier: Classifier<'t>,
    policy: BatchPolicy,
    files: F,
    metadata: M,
    auth: A,
}

impl<'t, F, M, A> IntakeService<'t, F, M, A>
where
    F: FileStore,
    M: MetadataStore,
    A: AuthProvider,
{
    pub fn new(classifier: Classifier<'t>, files: F, metadata: M, auth: A) -> Self {
        Self {
            classifier,
            policy: BatchPolicy::default(),
            files,
            metadata,
            auth,
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn classifier(&self) -> Classifier<'t> {
        self.classifier
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn auth_mut(&mut self) -> &mut A {
        &mut self.auth
    }

    fn owner(&self) -> Result<OwnerId> {
        self.auth.current_owner_id()
    }

    /// 所有者の登録済みファイル名
    pub fn existing_filenames(&self) -> Result<Vec<String>> {
        let owner = self.owner()?;
        Ok(self
            .metadata
            .list_by_owner(&owner, None)?
            .into_iter()
            .map(|r| r.filename)
            .collect())
    }

    /// 一括アップロード
    ///
    /// 却下・保存失敗は該当ファイルのみ報告し、他のファイルの処理は続ける。
    pub fn upload(&mut self, files: Vec<UploadFile>) -> Result<UploadReport> {
        let owner = self.owner()?;
        let existing = self.existing_filenames()?;
        let base_order = existing.len() as u32;

        let candidates: Vec<UploadCandidate> = files.iter().map(|f| f.candidate.clone()).collect();
        let outcome = self
            .classifier
            .validate_batch_with(self.policy, &candidates, &existing);
        debug!(
            "batch validated: {} accepted, {} rejected",
            outcome.accepted.len(),
            outcome.rejected.len()
        );

        let mut report = UploadReport {
            rejected: outcome.rejected,
            ..Default::default()
        };
        let mut pending: Vec<NewImageRecord> = Vec::with_capacity(outcome.accepted.len());

        for accepted in outcome.accepted {
            let file = &files[accepted.index];
            // 申告が空なら拡張子から補う
            let mime_type = match file.candidate.mime_type.trim() {
                "" => mime_for_file_name(&file.candidate.file_name).to_string(),
                declared => declared.to_string(),
            };

            match self.files.store(&owner, &file.bytes, &mime_type) {
                Ok(locator) => {
                    let mut record = NewImageRecord::from_parsed(
                        file.candidate.file_name.clone(),
                        accepted.parsed,
                        locator,
                        file.bytes.len() as u64,
                        mime_type,
                        owner.clone(),
                    );
                    record.sort_order = base_order + pending.len() as u32;
                    pending.push(record);
                }
                Err(e) => {
                    warn!("failed to store {}: {}", file.candidate.file_name, e);
                    report.failed.push(FailedUpload {
                        file_name: file.candidate.file_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if pending.is_empty() {
            return Ok(report);
        }

        let locators: Vec<Locator> = pending.iter().map(|r| r.storage_path.clone()).collect();
        match self.metadata.insert_many(pending) {
            Ok(inserted) => {
                info!("uploaded {} file(s) for {}", inserted.len(), owner);
                report.inserted = inserted;
                Ok(report)
            }
            Err(e) => {
                // メタデータ登録に失敗したら保存済みの本体を戻す
                for locator in &locators {
                    if let Err(remove_err) = self.files.remove(locator) {
                        warn!("failed to roll back {}: {}", locator, remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// 所有者のレコード一覧（絞り込みあり）
    pub fn list(&self, filter: &GalleryFilter) -> Result<Vec<ImageRecord>> {
        let owner = self.owner()?;
        let records = self.metadata.list_by_owner(&owner, filter.category)?;
        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// 所有者のレコードを取得（他人のものは見つからない扱い）
    fn owned_record(&self, owner: &OwnerId, id: &str) -> Result<ImageRecord> {
        let record = self.metadata.get(id)?;
        if &record.uploaded_by != owner {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(record)
    }

    /// 表示用URL
    pub fn retrieve_url(&self, id: &str) -> Result<String> {
        let owner = self.owner()?;
        let record = self.owned_record(&owner, id)?;
        self.files.retrieve_url(&record.storage_path)
    }

    /// 1件削除（本体も削除）
    pub fn delete(&mut self, id: &str) -> Result<ImageRecord> {
        let owner = self.owner()?;
        let record = self.owned_record(&owner, id)?;

        self.remove_blob(&record.storage_path)?;
        let removed = self.metadata.delete_by_id(id)?;
        info!("deleted {} ({})", removed.filename, removed.id);
        Ok(removed)
    }

    /// カテゴリ内を全削除し、件数を返す
    pub fn delete_category(&mut self, category: Category) -> Result<usize> {
        let owner = self.owner()?;
        let records = self.metadata.list_by_owner(&owner, Some(category))?;

        for record in &records {
            self.remove_blob(&record.storage_path)?;
        }
        let count = self.metadata.delete_by_category(&owner, category)?;
        info!("deleted {} file(s) in {}", count, category);
        Ok(count)
    }

    /// 本体が既に無い場合はメタデータの削除を続ける
    fn remove_blob(&mut self, locator: &Locator) -> Result<()> {
        match self.files.remove(locator) {
            Ok(()) => Ok(()),
            Err(Error::NotFound(_)) => {
                warn!("blob already missing: {}", locator);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
