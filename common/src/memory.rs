//! インメモリ実装（テスト・組み込み用）

use crate::category::Category;
use crate::error::{Error, Result};
use crate::record::{ImageRecord, NewImageRecord};
use crate::store::{extension_for_mime, AuthProvider, FileStore, Locator, MetadataStore, OwnerId};
use chrono::Utc;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Blob {
    mime_type: String,
    bytes: Vec<u8>,
}

/// メモリ上のファイルストア
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    blobs: HashMap<Locator, Blob>,
    next_seq: u64,
    /// 合計バイト数の上限
    quota: Option<usize>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn contains(&self, locator: &Locator) -> bool {
        self.blobs.contains_key(locator)
    }

    pub fn bytes(&self, locator: &Locator) -> Option<&[u8]> {
        self.blobs.get(locator).map(|b| b.bytes.as_slice())
    }

    fn used(&self) -> usize {
        self.blobs.values().map(|b| b.bytes.len()).sum()
    }
}

impl FileStore for MemoryFileStore {
    fn store(&mut self, owner: &OwnerId, bytes: &[u8], mime_type: &str) -> Result<Locator> {
        if let Some(quota) = self.quota {
            if self.used() + bytes.len() > quota {
                return Err(Error::StorageQuota(format!(
                    "{} bytes requested, {} of {} used",
                    bytes.len(),
                    self.used(),
                    quota
                )));
            }
        }

        self.next_seq += 1;
        let locator = Locator::new(format!(
            "{}/{}.{}",
            owner,
            self.next_seq,
            extension_for_mime(mime_type)
        ));
        self.blobs.insert(
            locator.clone(),
            Blob {
                mime_type: mime_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(locator)
    }

    fn retrieve_url(&self, locator: &Locator) -> Result<String> {
        let blob = self
            .blobs
            .get(locator)
            .ok_or_else(|| Error::NotFound(locator.to_string()))?;
        Ok(format!("memory://{}?type={}", locator, blob.mime_type))
    }

    fn remove(&mut self, locator: &Locator) -> Result<()> {
        self.blobs
            .remove(locator)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(locator.to_string()))
    }
}

/// メモリ上のメタデータストア
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    records: Vec<ImageRecord>,
    next_id: u64,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn insert_many(&mut self, records: Vec<NewImageRecord>) -> Result<Vec<ImageRecord>> {
        let now = Utc::now();
        let inserted: Vec<ImageRecord> = records
            .into_iter()
            .map(|r| {
                self.next_id += 1;
                r.into_record(format!("img-{}", self.next_id), now)
            })
            .collect();
        self.records.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    fn list_by_owner(&self, owner: &OwnerId, category: Option<Category>) -> Result<Vec<ImageRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.uploaded_by == owner)
            .filter(|r| category.map_or(true, |c| r.category == c))
            .cloned()
            .collect())
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
        Ok(self.records.remove(pos))
    }

    fn delete_by_category(&mut self, owner: &OwnerId, category: Category) -> Result<usize> {
        let before = self.records.len();
        self.records
            .retain(|r| !(&r.uploaded_by == owner && r.category == category));
        Ok(before - self.records.len())
    }
}

/// 固定の認証状態
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    owner: Option<OwnerId>,
}

impl StaticAuth {
    pub fn signed_in(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(OwnerId::new(owner)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, owner: impl Into<String>) {
        self.owner = Some(OwnerId::new(owner));
    }

    pub fn sign_out(&mut self) {
        self.owner = None;
    }
}

impl AuthProvider for StaticAuth {
    fn current_owner_id(&self) -> Result<OwnerId> {
        self.owner.clone().ok_or(Error::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::parse_image_filename;

    fn new_record(owner: &OwnerId, name: &str) -> NewImageRecord {
        NewImageRecord::from_parsed(
            name,
            parse_image_filename(name),
            Locator::new(format!("{}/{}", owner, name)),
            1,
            "image/jpeg",
            owner.clone(),
        )
    }

    #[test]
    fn test_file_store_roundtrip() {
        let mut store = MemoryFileStore::new();
        let owner = OwnerId::new("alice");
        let locator = store.store(&owner, b"jpeg bytes", "image/jpeg").unwrap();

        assert!(locator.as_str().starts_with("alice/"));
        assert!(locator.as_str().ends_with(".jpg"));
        assert_eq!(store.bytes(&locator), Some(&b"jpeg bytes"[..]));
        assert!(store.retrieve_url(&locator).unwrap().starts_with("memory://alice/"));

        store.remove(&locator).unwrap();
        assert!(matches!(store.remove(&locator), Err(Error::NotFound(_))));
        assert!(matches!(store.retrieve_url(&locator), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_file_store_quota() {
        let mut store = MemoryFileStore::with_quota(8);
        let owner = OwnerId::new("alice");
        store.store(&owner, b"12345", "image/png").unwrap();

        let err = store.store(&owner, b"6789", "image/png").unwrap_err();
        assert!(matches!(err, Error::StorageQuota(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_metadata_insert_and_list() {
        let mut store = MemoryMetadataStore::new();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");

        let inserted = store
            .insert_many(vec![
                new_record(&alice, "vi_ptx_1.jpg"),
                new_record(&bob, "vi_ptx_2.jpg"),
                new_record(&alice, "sc_sf6_1.jpg"),
            ])
            .unwrap();
        assert_eq!(inserted.len(), 3);
        assert_ne!(inserted[0].id, inserted[1].id);

        let all = store.list_by_owner(&alice, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].filename, "vi_ptx_1.jpg");

        let defects = store.list_by_owner(&alice, Some(Category::VisualDefect)).unwrap();
        assert_eq!(defects.len(), 1);
    }

    #[test]
    fn test_metadata_delete() {
        let mut store = MemoryMetadataStore::new();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");
        let inserted = store
            .insert_many(vec![
                new_record(&alice, "vi_ptx_1.jpg"),
                new_record(&alice, "vi_ltx_1.jpg"),
                new_record(&bob, "vi_ptx_1.jpg"),
            ])
            .unwrap();

        let removed = store.delete_by_id(&inserted[0].id).unwrap();
        assert_eq!(removed.filename, "vi_ptx_1.jpg");
        assert!(matches!(store.delete_by_id(&inserted[0].id), Err(Error::NotFound(_))));

        // 他の所有者のレコードは残る
        assert_eq!(store.delete_by_category(&alice, Category::VisualDefect).unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&inserted[2].id).unwrap().uploaded_by, bob);
    }

    #[test]
    fn test_static_auth() {
        let mut auth = StaticAuth::signed_out();
        assert!(matches!(auth.current_owner_id(), Err(Error::Unauthenticated)));

        auth.sign_in("alice");
        assert_eq!(auth.current_owner_id().unwrap(), OwnerId::new("alice"));

        auth.sign_out();
        assert!(auth.current_owner_id().is_err());
    }
}
