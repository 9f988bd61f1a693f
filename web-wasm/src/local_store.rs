//! ブラウザのlocalStorageを使ったストア実装
//!
//! 本体はbase64のdata URLとして1件ずつ別キーに保存し、
//! メタデータは1つのJSON配列として保存する。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use gloo::storage::{errors::StorageError, LocalStorage, Storage};
use substation_intake_common::store::extension_for_mime;
use substation_intake_common::{
    AuthProvider, Category, Error, FileStore, ImageRecord, IntakeService, Locator, MetadataStore,
    NewImageRecord, OwnerId, Result, TaxonomyTable,
};

const BLOB_KEY_PREFIX: &str = "substation-intake.blob.";
const SEQ_KEY: &str = "substation-intake.seq";
const RECORDS_KEY: &str = "substation-intake.records";
const OWNER_KEY: &str = "substation-intake.owner";

/// ブラウザ版で使う受付サービスの型
pub type LocalIntakeService = IntakeService<'static, LocalFileStore, LocalMetadataStore, SessionAuth>;

/// 保存済みの状態からサービスを組み立てる
pub fn open_service() -> LocalIntakeService {
    IntakeService::new(
        substation_intake_common::Classifier::new(TaxonomyTable::builtin()),
        LocalFileStore,
        LocalMetadataStore::load(),
        SessionAuth::load(),
    )
}

fn storage_error(err: StorageError) -> Error {
    match err {
        StorageError::KeyNotFound(key) => Error::NotFound(key),
        StorageError::SerdeError(e) => Error::Storage(e.to_string()),
        // setItemの失敗は容量超過がほとんど
        StorageError::JsError(e) => Error::StorageQuota(e.to_string()),
    }
}

fn blob_key(locator: &Locator) -> String {
    format!("{}{}", BLOB_KEY_PREFIX, locator)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn store(&mut self, owner: &OwnerId, bytes: &[u8], mime_type: &str) -> Result<Locator> {
        let seq: u64 = LocalStorage::get(SEQ_KEY).unwrap_or(0) + 1;
        let locator = Locator::new(format!(
            "{}/{}.{}",
            owner,
            seq,
            extension_for_mime(mime_type)
        ));

        let mime = if mime_type.is_empty() { "application/octet-stream" } else { mime_type };
        let data_url = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));

        LocalStorage::set(blob_key(&locator), data_url).map_err(storage_error)?;
        LocalStorage::set(SEQ_KEY, seq).map_err(storage_error)?;
        Ok(locator)
    }

    fn retrieve_url(&self, locator: &Locator) -> Result<String> {
        LocalStorage::get::<String>(blob_key(locator)).map_err(storage_error)
    }

    fn remove(&mut self, locator: &Locator) -> Result<()> {
        let key = blob_key(locator);
        if LocalStorage::raw().get_item(&key).ok().flatten().is_none() {
            return Err(Error::NotFound(locator.to_string()));
        }
        LocalStorage::delete(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalMetadataStore {
    records: Vec<ImageRecord>,
}

impl LocalMetadataStore {
    pub fn load() -> Self {
        Self {
            records: LocalStorage::get(RECORDS_KEY).unwrap_or_default(),
        }
    }

    /// 書き込みに成功したときだけメモリ上の内容を差し替える
    fn commit(&mut self, records: Vec<ImageRecord>) -> Result<()> {
        LocalStorage::set(RECORDS_KEY, &records).map_err(storage_error)?;
        self.records = records;
        Ok(())
    }
}

impl MetadataStore for LocalMetadataStore {
    fn insert_many(&mut self, records: Vec<NewImageRecord>) -> Result<Vec<ImageRecord>> {
        let now = chrono::Utc::now();
        let stamp = js_sys::Date::now() as u64;

        let inserted: Vec<ImageRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_record(format!("img-{}-{}", stamp, i), now))
            .collect();

        let mut next = self.records.clone();
        next.extend(inserted.iter().cloned());
        self.commit(next)?;
        Ok(inserted)
    }

    fn list_by_owner(&self, owner: &OwnerId, category: Option<Category>) -> Result<Vec<ImageRecord>> {
        let mut records: Vec<ImageRecord> = self
            .records
            .iter()
            .filter(|r| &r.uploaded_by == owner)
            .filter(|r| category.map_or(true, |c| r.category == c))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.sort_order);
        Ok(records)
    }

    fn get(&self, id: &str) -> Result<ImageRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn delete_by_id(&mut self, id: &str) -> Result<ImageRecord> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let mut next = self.records.clone();
        let removed = next.remove(pos);
        self.commit(next)?;
        Ok(removed)
    }

    fn delete_by_category(&mut self, owner: &OwnerId, category: Category) -> Result<usize> {
        let next: Vec<ImageRecord> = self
            .records
            .iter()
            .filter(|r| !(&r.uploaded_by == owner && r.category == category))
            .cloned()
            .collect();
        let removed = self.records.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        Ok(removed)
    }
}

/// localStorageに保持するサインイン状態
#[derive(Debug, Clone, Default)]
pub struct SessionAuth {
    owner: Option<String>,
}

impl SessionAuth {
    pub fn load() -> Self {
        Self {
            owner: LocalStorage::get(OWNER_KEY).ok(),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn sign_in(&mut self, owner: &str) -> Result<()> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(Error::Unauthenticated);
        }
        LocalStorage::set(OWNER_KEY, owner).map_err(storage_error)?;
        self.owner = Some(owner.to_string());
        Ok(())
    }

    pub fn sign_out(&mut self) {
        LocalStorage::delete(OWNER_KEY);
        self.owner = None;
    }
}

impl AuthProvider for SessionAuth {
    fn current_owner_id(&self) -> Result<OwnerId> {
        self.owner
            .as_deref()
            .map(OwnerId::new)
            .ok_or(Error::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substation_intake_common::{GalleryFilter, UploadFile};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn clear() {
        let _ = LocalStorage::raw().clear();
    }

    #[wasm_bindgen_test]
    fn test_upload_persists_across_reload() {
        clear();
        let mut service = open_service();
        service.auth_mut().sign_in("inspector-1").unwrap();

        let report = service
            .upload(vec![UploadFile::new("vi_ptx_1.jpg", "image/jpeg", vec![1, 2, 3])])
            .unwrap();
        assert_eq!(report.inserted.len(), 1);

        // 読み直しても残っている
        let reloaded = open_service();
        let records = reloaded.list(&GalleryFilter::default()).unwrap();
        assert_eq!(records.len(), 1);

        let url = reloaded.retrieve_url(&records[0].id).unwrap();
        assert_eq!(url, "data:image/jpeg;base64,AQID");
    }

    #[wasm_bindgen_test]
    fn test_delete_category_persists() {
        clear();
        let mut service = open_service();
        service.auth_mut().sign_in("inspector-1").unwrap();
        service
            .upload(vec![
                UploadFile::new("vi_ptx_1.jpg", "image/jpeg", vec![1]),
                UploadFile::new("ts_cbm_1.pdf", "application/pdf", vec![2]),
            ])
            .unwrap();

        assert_eq!(service.delete_category(Category::VisualDefect).unwrap(), 1);

        let reloaded = open_service();
        let records = reloaded.list(&GalleryFilter::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "ts_cbm_1.pdf");
    }

    #[wasm_bindgen_test]
    fn test_signed_out_is_unauthenticated() {
        clear();
        let service = open_service();
        assert!(matches!(
            service.list(&GalleryFilter::default()),
            Err(Error::Unauthenticated)
        ));
    }
}
